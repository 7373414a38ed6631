pub mod db_utils;
pub mod device_filter;
pub mod office_cache;
