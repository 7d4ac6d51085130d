pub mod telegram_auth_service;
pub mod ticket_qr_service;
