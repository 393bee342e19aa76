//! Terminal output helpers

mod printer;
pub mod table;

pub use printer::{
    format_age, print_header, print_info, print_key_value, print_success, print_warning,
};
pub use table::{print_presence, print_records};
