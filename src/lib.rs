pub mod database_ops;

pub mod util {
    pub mod env;
}
