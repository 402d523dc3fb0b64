//! RemoteStore implementation tests

#[cfg(feature = "postgrest")]
mod postgrest;
