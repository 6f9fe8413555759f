pub mod email_service;
pub mod email_templates;
pub mod image_service;
pub mod notification_service;
pub mod pricing_service;
