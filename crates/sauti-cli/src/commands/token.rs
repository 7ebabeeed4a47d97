//! Token administration commands.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use sauti_core::{AuthTokenRecord, Error, TokenStore};

pub fn create(
    tokens: &TokenStore,
    name: &str,
    expires_in_days: Option<i64>,
    quiet: bool,
) -> anyhow::Result<()> {
    let expires_at = expires_in_days.map(|days| Utc::now() + Duration::days(days));
    let (record, secret) = tokens.issue(name, expires_at)?;
    let token_string = record.encode(&secret);

    if quiet {
        println!("{token_string}");
        return Ok(());
    }

    println!("Token created successfully!\n");
    println!("  ID:         {}", record.id);
    println!("  Name:       {}", record.name);
    println!("  Created:    {}", format_time(record.created_at));
    match record.expires_at {
        Some(expires_at) => println!("  Expires:    {}", format_time(expires_at)),
        None => println!("  Expires:    Never"),
    }
    println!("\n  Token:      {token_string}");
    println!("\nStore this token securely - it cannot be retrieved later.");
    Ok(())
}

pub fn list(tokens: &TokenStore) -> anyhow::Result<()> {
    let records = tokens.list()?;
    if records.is_empty() {
        println!("No tokens issued.");
        return Ok(());
    }

    for record in &records {
        print_record(record);
        println!();
    }
    println!("{} token(s)", records.len());
    Ok(())
}

pub fn show(tokens: &TokenStore, id: Uuid) -> anyhow::Result<()> {
    match tokens.get(id)? {
        Some(record) => {
            print_record(&record);
            Ok(())
        }
        None => anyhow::bail!("Token not found: {id}"),
    }
}

pub fn revoke(tokens: &TokenStore, id: Uuid) -> anyhow::Result<()> {
    if tokens.revoke(id)? {
        println!("Token {id} revoked.");
        Ok(())
    } else {
        anyhow::bail!("Token not found: {id}")
    }
}

pub fn delete(tokens: &TokenStore, id: Uuid) -> anyhow::Result<()> {
    if tokens.delete(id)? {
        println!("Token {id} deleted.");
        Ok(())
    } else {
        anyhow::bail!("Token not found: {id}")
    }
}

pub fn verify(tokens: &TokenStore, token: &str) -> anyhow::Result<()> {
    match tokens.verify(token) {
        Ok(record) => {
            println!("Token is valid.\n");
            print_record(&record);
            Ok(())
        }
        Err(Error::InvalidCredential) => {
            println!("Token is invalid.");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn print_record(record: &AuthTokenRecord) {
    println!("  ID:         {}", record.id);
    println!("  Name:       {}", record.name);
    println!("  Created:    {}", format_time(record.created_at));
    println!(
        "  Last used:  {}",
        record
            .last_used_at
            .map_or_else(|| "Never".to_string(), format_time)
    );
    println!(
        "  Expires:    {}",
        record
            .expires_at
            .map_or_else(|| "Never".to_string(), format_time)
    );
    println!("  Revoked:    {}", if record.revoked { "yes" } else { "no" });
}

fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
