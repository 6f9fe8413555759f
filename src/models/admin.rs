use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminStats {
    pub users: i64,
    /// Active products only.
    pub products: i64,
    pub orders: i64,
    /// Sum of order totals, cancelled orders excluded.
    pub revenue: Decimal,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub url: String,
}

impl UploadResponse {
    pub fn new(url: String) -> Self {
        Self {
            success: true,
            message: "Image uploaded".to_string(),
            url,
        }
    }
}
