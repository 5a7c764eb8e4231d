pub mod greendish_backend;
