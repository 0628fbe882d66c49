//! Mint a bearer token for local testing.
//!
//! Identities normally come from an external provider; this signs a token
//! with the server's `JWT_SECRET` so the API can be exercised by hand.

use anyhow::Context;
use clap::Parser;
use uuid::Uuid;

use dididaren_server::auth::{generate_access_token, JwtKeys};
use dididaren_server::models::Role;

#[derive(Parser, Debug)]
#[command(name = "issue-token", about = "Sign a dispatch API bearer token")]
struct Args {
    /// User id to embed; a random one is generated when omitted
    #[arg(long)]
    user_id: Option<Uuid>,

    /// user, staff or admin
    #[arg(long, default_value = "user")]
    role: Role,

    /// Token lifetime in hours
    #[arg(long, default_value_t = 24)]
    ttl_hours: i64,

    /// Signing secret; falls back to JWT_SECRET
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    secret: String,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let user_id = args.user_id.unwrap_or_else(Uuid::new_v4);
    let keys = JwtKeys::new(&args.secret, args.ttl_hours);
    let token = generate_access_token(&keys, user_id, args.role).context("failed to sign token")?;

    println!("user_id: {user_id}");
    println!("role:    {:?}", args.role);
    println!("token:   {token}");
    Ok(())
}
