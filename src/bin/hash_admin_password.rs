//! Offline provisioning tool for the local auth backend.
//!
//! Prints an argon2 hash for a password together with the SQL that creates
//! the user and grants it admin rights. Not part of the server.
//!
//! Usage: `hash-admin-password <email>` and type the password on stdin.

use std::io::{self, BufRead};
use std::process::ExitCode;

use community_portal::auth::hash_password;
use uuid::Uuid;

fn main() -> ExitCode {
    let Some(email) = std::env::args().nth(1) else {
        eprintln!("usage: hash-admin-password <email>  (password is read from stdin)");
        return ExitCode::FAILURE;
    };

    let mut password = String::new();
    if let Err(e) = io::stdin().lock().read_line(&mut password) {
        eprintln!("failed to read password: {e}");
        return ExitCode::FAILURE;
    }
    let password = password.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        eprintln!("password must not be empty");
        return ExitCode::FAILURE;
    }

    let hash = match hash_password(password) {
        Ok(hash) => hash,
        Err(e) => {
            eprintln!("hashing failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let id = Uuid::new_v4();
    let email = email.replace('\'', "''");
    println!("-- password hash: {hash}");
    println!(
        "INSERT INTO users (id, email, role, password_hash) VALUES ('{id}', '{email}', 'admin', '{hash}');"
    );
    println!("INSERT INTO admin_users (id) VALUES ('{id}');");
    ExitCode::SUCCESS
}
