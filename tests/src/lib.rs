//! Integration tests running the client against a `wiremock` backend over
//! real HTTP.

#[cfg(test)]
mod unit;
