pub mod breverse_ops;
