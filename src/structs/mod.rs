pub mod alias;
pub mod record;
pub mod request;
pub mod respond;
