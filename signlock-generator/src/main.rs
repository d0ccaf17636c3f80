#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::{Builder, Env};
use log::info;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha2::{Digest, Sha512};

use signlock::codec::{KEY_FOOTER, KEY_HEADER};
use signlock::{KeyCodec, LicenseKey, LicenseTier};

#[derive(Parser)]
#[command(version, about="License Admin Tool for Signlock", long_about = None)]
#[command(propagate_version = true)]
struct Opts {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue a new signed license key
    Generate {
        /// Signing key, PKCS#8 PEM
        #[clap(long)]
        key: PathBuf,

        /// Customer ID
        #[clap(long)]
        customer: String,

        /// Customer Name
        #[clap(long)]
        name: String,

        /// community, individual or business
        #[clap(long, default_value = "business")]
        tier: String,

        /// Number of days until the key expires
        #[clap(long, default_value_t = 365)]
        days: i64,

        /// Issue a trial key (expires against the wall clock)
        #[clap(long)]
        trial: bool,

        /// Also cover the pdf product
        #[clap(long)]
        pdf: bool,
    },
    /// Decode and validate a key file against a public key
    Validate {
        /// Trusted public key, SPKI PEM
        #[clap(long)]
        key: PathBuf,

        /// File holding the license key blob
        file: PathBuf,
    },
    /// Generate a new keypair.
    Keys,
}

const CREATOR_NAME: &str = "Signlock Support";
const CREATOR_EMAIL: &str = "support@signlock.dev";

fn main() {
    Builder::from_env(Env::default().default_filter_or("info")).init();

    let opts = Opts::parse();

    match opts.command {
        Commands::Generate { key, customer, name, tier, days, trial, pdf } => {
            issue(&key, customer, name, &tier, days, trial, pdf);
        }
        Commands::Validate { key, file } => validate(&key, &file),
        Commands::Keys => generate_new_keys(),
    }
}

fn parse_tier(tier: &str) -> LicenseTier {
    match tier {
        "community" => LicenseTier::Community,
        "individual" => LicenseTier::Individual,
        "business" => LicenseTier::Business,
        _ => LicenseTier::Unlicensed,
    }
}

#[allow(clippy::fn_params_excessive_bools)]
fn issue(key_path: &Path, customer: String, name: String, tier: &str, days: i64, trial: bool, pdf: bool) {
    info!("CustomerID: {customer:?}");
    info!("Customer Name: {name:?}");
    info!("Tier: {tier} Days: {days} Trial: {trial}");

    let pem = std::fs::read_to_string(key_path).expect("signing key file is readable");
    let private_key = RsaPrivateKey::from_pkcs8_pem(&pem).expect("signing key parses");

    header("Building License Object");

    let now = Utc::now();
    let lic = LicenseKey {
        license_id: format!("lic-{}", now.timestamp_millis()),
        customer_id: customer,
        customer_name: name,
        tier: parse_tier(tier),
        created_at: now,
        expires_at: now + Duration::days(days),
        creator_name: CREATOR_NAME.to_owned(),
        creator_email: CREATOR_EMAIL.to_owned(),
        office: true,
        pdf,
        trial,
    };

    info!("{lic:#?}");

    header("Signing License Object");

    let payload = serde_json::to_vec(&lic).unwrap();
    let digest = Sha512::digest(&payload);
    let signature = private_key.sign(Pkcs1v15Sign::new::<Sha512>(), digest.as_slice()).unwrap();

    let blob = format!("{KEY_HEADER}\n{}\n+\n{}\n{KEY_FOOTER}\n", STANDARD.encode(&payload), STANDARD.encode(&signature));
    info!("Done");

    header("Testing Key Decode");

    let public_pem = private_key.to_public_key().to_public_key_pem(LineEnding::LF).unwrap();
    let codec = KeyCodec::with_public_key_pem(&public_pem).unwrap();

    if let Ok(decoded) = codec.decode(&blob) {
        info!("License Decoded: {decoded:#?}");
    } else {
        info!("Failed to Decode License");
    }

    header("Working License Key");
    println!("{}", blob.bright_yellow());
}

fn validate(key_path: &Path, file: &Path) {
    info!("Validating Key File: {}", file.display());

    let pem = std::fs::read_to_string(key_path).expect("public key file is readable");
    let blob = std::fs::read_to_string(file).expect("key file is readable");

    let codec = KeyCodec::with_public_key_pem(&pem).expect("public key parses");

    match codec.decode(&blob) {
        Ok(lic) => {
            info!("License Decoded: {lic:#?}");
            match lic.validate() {
                Ok(()) => info!("License Valid"),
                Err(e) => info!("License Invalid: {e}"),
            }
        }
        Err(e) => info!("Failed to Decode License: {e}"),
    }
}

//////////////////////////////////////////////////

fn generate_new_keys() {
    info!("Generating RSA-2048 Keypair, this can take a moment");

    let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("keygen");
    let private_pem = private_key.to_pkcs8_pem(LineEnding::LF).expect("pem encode");
    let public_pem = private_key.to_public_key().to_public_key_pem(LineEnding::LF).expect("pem encode");

    info!("\nPrivate Key:\n{}\nPublic Key:\n{}", &*private_pem, public_pem);
}

fn header(title: &str) {
    info!("\n{}", "-----------------------------------------------".white().on_blue());
    info!("        {}", title.white());
    info!("{}", "-----------------------------------------------".white().on_blue());
}
