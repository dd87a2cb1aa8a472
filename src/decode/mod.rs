pub mod date;
pub mod packed;
pub mod safe;

pub use date::{
    date_to_sas, dmy_num, sas_to_date, value_date, ymd_num, z11_date, DateEncoding,
};
pub use packed::{packed_date, unpack_decimal, unpack_integer};
pub use safe::{safe_float, safe_int, safe_str};
