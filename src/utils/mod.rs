pub mod extractors;
pub mod jwt;
pub mod order_number;
pub mod password;
pub mod slug;
