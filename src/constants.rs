use crate::model::CatalogEntry;
use std::time::Duration;

pub const APP_DATA_DIR: &str = "ux0:data/vitasweep/";
pub const SCAN_CACHE_FILE: &str = "ux0:data/vitasweep/scan_cache.bin";
pub const COUNTER_FILE: &str = "ux0:data/vitasweep/counter.bin";

pub const CACHE_VERSION: u32 = 2;
pub const CACHE_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);
pub const CACHE_CAPACITY: usize = 100;
pub const CACHE_MAX_KEY_LEN: usize = 255;

pub const PREVIEW_INITIAL_CAPACITY: usize = 100;
pub const MAX_RECORD_PATH: usize = 1024;

pub const FORCE_DELETE_ATTEMPTS: u32 = 3;
pub const FORCE_DELETE_DELAY: Duration = Duration::from_millis(100);
pub const SWEEP_DELETE_ATTEMPTS: u32 = 5;
pub const SWEEP_DELETE_DELAY: Duration = Duration::from_millis(200);
pub const EMERGENCY_SETTLE_DELAY: Duration = Duration::from_millis(500);

pub const DUMP_GLOBS: &[&str] = &["psp2core*", "*.psp2core", "psp2dmp*", "*.psp2dmp"];
pub const DUMP_GLOB_DIR: &str = "ux0:data/";
pub const DUMP_PATTERN: CatalogEntry = CatalogEntry::Pattern {
    dir: DUMP_GLOB_DIR,
    globs: DUMP_GLOBS,
};
pub const DUMP_DIRS: &[&str] = &[
    "ux0:data/crash_dumps/",
    "ux0:data/dumps/",
    "ux0:data/Adrenaline/dumps/",
    "ux0:data/Adrenaline/crash/",
];
pub const DUMP_SEARCH_DIRS: &[&str] = &["ux0:data/", "ux0:temp/", "ux0:cache/", "ux0:log/"];
pub const DUMP_SUFFIXES: &[&str] = &[".psp2dmp", ".psp2core", ".psp2dmp.tmp"];
pub const DUMP_BARE_NAMES: &[&str] = &["psp2core", "psp2dmp"];

pub const PACKAGE_DIR: &str = "ux0:pkgi/";
pub const PACKAGE_SUFFIX: &str = ".pkg";

pub const PICTURE_PREFIX: &str = "ux0:picture/";
pub const MOONLIGHT_PREFIX: &str = "ux0:data/moonlight/";
pub const VITASHELL_MARKERS: &[&str] = &["VitaShell/"];
pub const PKGI_MARKERS: &[&str] = &["pkgi/"];
pub const RETROARCH_MARKERS: &[&str] = &["retroarch/"];
pub const ADRENALINE_MARKERS: &[&str] = &["Adrenaline/"];
pub const BROWSER_MARKERS: &[&str] = &["browser/", "webkit/"];
pub const SYSTEM_MARKERS: &[&str] = &[":temp/", ":cache/", ":log/", "autoplugin", "tai/"];

pub const APP_ID_LEN: usize = 9;
pub const ORPHAN_MIN_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);
pub const APPS_ROOT: &str = "ux0:app/";
pub const DATA_ROOT: &str = "ux0:data/";
pub const LICENSE_ROOT: &str = "ux0:license/";
pub const LICENSE_ID_OFFSET: usize = 7;
pub const PATCH_ROOT: &str = "ux0:patch/";

/// Directories under the data root that belong to the system or to homebrew
/// frameworks rather than to an installed title.
pub const DATA_DENYLIST: &[&str] = &[
    "vitasweep",
    "VitaShell",
    "retroarch",
    "Adrenaline",
    "moonlight",
    "autoplugin",
    "autoplugin2",
    "henkaku",
    "VitaGrafix",
    "reF00D",
    "NoNpDrm",
    "0syscall6",
    "tai",
    "PSVshell",
    "savemgr",
    "vitacheat",
    "rinCheat",
    "TropHAX",
    "browser",
    "webkit",
    "crash_dumps",
    "dumps",
];

pub const CATALOG: &[CatalogEntry] = &[
    // System temporary folders
    CatalogEntry::Path("ux0:temp/"),
    CatalogEntry::Path("ux0:data/temp/"),
    CatalogEntry::Path("ux0:cache/"),
    CatalogEntry::Path("ux0:log/"),
    CatalogEntry::Path("ur0:temp/"),
    CatalogEntry::Path("ur0:temp/sqlite/"),
    CatalogEntry::Path("uma0:temp/"),
    // VitaShell
    CatalogEntry::Path("ux0:VitaShell/cache/"),
    CatalogEntry::Path("ux0:VitaShell/temp/"),
    CatalogEntry::Path("ux0:VitaShell/log/"),
    CatalogEntry::Path("ux0:VitaShell/recent/"),
    CatalogEntry::Path("ux0:VitaShell/backup/temp/"),
    CatalogEntry::Path("ux0:VitaShell/trash/"),
    // PKGi
    CatalogEntry::Path("ux0:pkgi/tmp/"),
    CatalogEntry::Path("ux0:pkgi/cache/"),
    CatalogEntry::Path("ux0:pkgi/log.txt"),
    CatalogEntry::Path("ux0:pkgi/downloads/temp/"),
    CatalogEntry::Path("ux0:pkgi/backup/temp/"),
    // RetroArch: cache and logs only, never saves or configs
    CatalogEntry::Path("ux0:data/retroarch/cache/"),
    CatalogEntry::Path("ux0:data/retroarch/logs/"),
    CatalogEntry::Path("ux0:data/retroarch/temp/"),
    CatalogEntry::Path("ux0:data/retroarch/thumbnails/cache/"),
    CatalogEntry::Path("ux0:data/retroarch/shaders/cache/"),
    CatalogEntry::Path("ux0:data/retroarch/database/rdb/temp/"),
    // PSP emulator
    CatalogEntry::Path("ux0:pspemu/temp/"),
    CatalogEntry::Path("ux0:pspemu/cache/"),
    // Adrenaline
    CatalogEntry::Path("ux0:data/Adrenaline/cache/"),
    CatalogEntry::Path("ux0:data/Adrenaline/logs/"),
    CatalogEntry::Path("ux0:data/Adrenaline/temp/"),
    CatalogEntry::Path("ux0:data/Adrenaline/crash/"),
    CatalogEntry::Path("ux0:data/Adrenaline/dumps/"),
    // Homebrew applications and plugins
    CatalogEntry::Path("ux0:data/moonlight/cache/"),
    CatalogEntry::Path("ux0:data/moonlight/logs/"),
    CatalogEntry::Path("ux0:data/autoplugin/cache/"),
    CatalogEntry::Path("ux0:data/autoplugin/logs/"),
    CatalogEntry::Path("ux0:data/autoplugin2/cache/"),
    CatalogEntry::Path("ux0:data/autoplugin2/logs/"),
    CatalogEntry::Path("ux0:data/henkaku/cache/"),
    CatalogEntry::Path("ux0:data/henkaku/logs/"),
    CatalogEntry::Path("ux0:data/VitaGrafix/cache/"),
    CatalogEntry::Path("ux0:data/VitaGrafix/logs/"),
    CatalogEntry::Path("ux0:data/reF00D/cache/"),
    CatalogEntry::Path("ux0:data/NoNpDrm/temp/"),
    CatalogEntry::Path("ux0:data/0syscall6/cache/"),
    CatalogEntry::Path("ux0:data/tai/cache/"),
    CatalogEntry::Path("ux0:data/PSVshell/logs/"),
    CatalogEntry::Path("ux0:data/PSVshell/cache/"),
    CatalogEntry::Path("ux0:data/savemgr/log/"),
    CatalogEntry::Path("ux0:data/vitacheat/logs/"),
    CatalogEntry::Path("ux0:data/rinCheat/logs/"),
    CatalogEntry::Path("ux0:data/TropHAX/logs/"),
    // Browser and webkit
    CatalogEntry::Path("ux0:data/browser/cache/"),
    CatalogEntry::Path("ux0:data/browser/temp/"),
    CatalogEntry::Path("ux0:data/browser/logs/"),
    CatalogEntry::Path("ux0:data/webkit/cache/"),
    CatalogEntry::Path("ux0:data/webkit/localstorage/temp/"),
    CatalogEntry::Path("ux0:data/net/temp/"),
    // Downloads
    CatalogEntry::Path("ux0:download/"),
    CatalogEntry::Path("ux0:download/temp/"),
    CatalogEntry::Path("ux0:downloads/"),
    CatalogEntry::Path("ux0:downloads/temp/"),
    CatalogEntry::Path("ux0:bgdl/t/"),
    // Package and installation leftovers
    CatalogEntry::Path("ux0:data/pkg/temp/"),
    CatalogEntry::Path("ux0:package/temp/"),
    CatalogEntry::Path("ux0:appmeta/temp/"),
    CatalogEntry::Path("ur0:appmeta/temp/"),
    CatalogEntry::Path("ux0:license/temp/"),
    CatalogEntry::Pattern {
        dir: PACKAGE_DIR,
        globs: &["*.pkg"],
    },
    // Update and patch leftovers
    CatalogEntry::Path("ux0:patch_temp/"),
    CatalogEntry::Path("ux0:update_temp/"),
    // Regenerable media thumbnails
    CatalogEntry::Path("ux0:picture/.thumbnails/"),
    CatalogEntry::Path("ux0:video/.thumbnails/"),
    CatalogEntry::Path("ux0:music/.cache/"),
    CatalogEntry::Path("ux0:photo/cache/"),
    CatalogEntry::Path("ux0:shaderlog/"),
    CatalogEntry::Path("ux0:data/logs/temp/"),
    CatalogEntry::Path("ux0:data/cache/"),
    // External storage
    CatalogEntry::Path("uma0:cache/"),
    CatalogEntry::Path("uma0:log/"),
    CatalogEntry::Path("uma0:data/temp/"),
    CatalogEntry::Path("uma0:data/cache/"),
    // Crash dumps, never user data
    DUMP_PATTERN,
    CatalogEntry::Path("ux0:data/crash_dumps/"),
    CatalogEntry::Path("ux0:data/dumps/"),
];
