//! Prints the admin credential lines for `.env`:
//! `hash-password <EMAIL> <PASSWORD>`

use anyhow::{bail, Context};
use bcrypt::{verify, DEFAULT_COST};
use portfolio_cms::store::auth::AuthConfig;
use rand::distr::{Alphanumeric, SampleString};

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let (Some(email), Some(password)) = (args.next(), args.next()) else {
        bail!("Usage: cargo run --bin hash-password <EMAIL> <PASSWORD>");
    };
    if !email.contains('@') {
        bail!("'{}' is not an email address", email);
    }
    if password.len() < 8 {
        bail!("password must be at least 8 characters");
    }

    let jwt_secret = Alphanumeric.sample_string(&mut rand::rng(), 48);
    let config = AuthConfig::with_password(&email, &password, &jwt_secret, DEFAULT_COST)
        .context("hashing password")?;
    if !verify(&password, &config.password_hash).unwrap_or(false) {
        bail!("generated hash does not verify");
    }

    println!("# Paste these into your .env:");
    println!("ADMIN_EMAIL={}", config.admin_email);
    println!("ADMIN_HASH_PASSWORD='{}'", config.password_hash);
    println!("JWT_SECRET={}", config.jwt_secret);
    Ok(())
}
