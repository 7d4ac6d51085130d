pub mod auth;
pub mod checkin;
pub mod event;
pub mod init_data;
pub mod ticket;
pub mod ticket_qr;
pub mod user;
