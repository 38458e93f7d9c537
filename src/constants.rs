// Server configuration
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "3000";
pub const DEFAULT_DATA_PATH: &str = "data";
pub const DEFAULT_CORS_ORIGINS: &str = "*";
pub const API_PREFIX: &str = "/api";

// Token configuration
pub const TOKEN_TYPE: &str = "bearer";
pub const DEFAULT_TOKEN_EXPIRY_MINUTES: i64 = 30 * 24 * 60;
pub const MAX_TOKEN_EXPIRY_MINUTES: i64 = 5 * 365 * 24 * 60;
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

// User defaults
pub const DEFAULT_CURRENCY: &str = "₹";
pub const DEFAULT_MONTHLY_BUDGET: f64 = 10_000.0;

// Transaction defaults
pub const DEFAULT_PAYMENT_TYPE: &str = "Cash";

// Database limits and defaults
pub const DEFAULT_TRANSACTIONS_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;
pub const MAX_OFFSET: u32 = 1_000_000;

// Validation limits
pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 255;
pub const MAX_PAYMENT_TYPE_LENGTH: usize = 50;
pub const MAX_CURRENCY_LENGTH: usize = 10;
pub const MAX_TAGS: usize = 20;
pub const MAX_TAG_LENGTH: usize = 50;
pub const MAX_TRANSACTION_AMOUNT: f64 = 1_000_000_000.0;

// Reporting
pub const RECENT_TRANSACTIONS_COUNT: usize = 10;
pub const TREND_DAYS: i64 = 7;
pub const INSIGHTS_WINDOW_DAYS: i64 = 30;
pub const DOMINANT_CATEGORY_PERCENT: f64 = 30.0;
pub const SMALL_PURCHASE_THRESHOLD: f64 = 100.0;
pub const SMALL_PURCHASE_COUNT: usize = 10;
pub const MAX_TIPS: usize = 3;

// Error messages
pub const ERR_DATABASE_OPERATION: &str = "Database operation failed";
pub const ERR_INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const ERR_UNAUTHORIZED: &str = "Could not validate credentials";
pub const ERR_EMAIL_TAKEN: &str = "Email already registered";
pub const ERR_TRANSACTION_NOT_FOUND: &str = "Transaction not found";
