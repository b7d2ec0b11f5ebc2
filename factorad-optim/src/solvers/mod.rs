pub mod projected;
