pub mod price;
pub mod record;
pub mod report;
