pub(crate) mod dns;
pub mod domain;
pub mod smtp;
pub mod text;

#[cfg(test)]
pub(crate) mod test_server;
