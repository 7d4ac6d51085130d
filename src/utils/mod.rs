pub mod jwt;
pub mod pii_masker;

#[cfg(test)]
pub mod test_app_state;
