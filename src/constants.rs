pub const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_MEDIA_ROOT: &str = "./media";
pub const DEFAULT_MEDIA_URL: &str = "/media/";
pub const DEFAULT_MEDIA_MOUNT: &str = "media";
pub const DEFAULT_TOKEN_TTL_HOURS: &str = "24";

pub const MIN_JWT_SECRET_LENGTH: usize = 32;
pub const MIN_PASSWORD_LENGTH: usize = 5;

pub const MAX_JSON_BODY_SIZE: u64 = 16 * 1024;

/// Upper bound for uploaded image bodies.
pub const MAX_IMAGE_SIZE: u64 = 10 * 1024 * 1024;

/// `NUMERIC(5, 2)`
pub const PRICE_MAX_DIGITS: u32 = 5;
pub const PRICE_DECIMAL_PLACES: u32 = 2;

pub const ASSIGNED_ONLY_VALUES: &[(&str, bool)] = &[("0", false), ("1", true)];
