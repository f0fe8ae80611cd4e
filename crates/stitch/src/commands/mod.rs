pub mod build;
pub mod dev;
pub mod info;
pub mod publish;
