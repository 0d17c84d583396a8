//! Password hash generator utility
//!
//! Usage: cargo run --example gen_hash -p leaveflow-auth -- <password>
//!
//! Prints an Argon2id hash and the SQL to insert an admin account by hand.

use leaveflow_auth::PasswordService;

fn main() -> Result<(), leaveflow_core::AppError> {
    let password = std::env::args().nth(1).unwrap_or_else(|| "admin123".to_string());

    let service = PasswordService::new();
    let hash = service.hash_password(&password)?;

    println!("Password: {}", password);
    println!("Hash: {}", hash);
    println!();
    println!("INSERT INTO users (id, name, email, password, role, total_leave, remaining_leave)");
    println!(
        "VALUES (gen_random_uuid(), 'Admin User', 'admin@leaveflow.com', '{}', 'admin', 25, 25);",
        hash
    );
    Ok(())
}
