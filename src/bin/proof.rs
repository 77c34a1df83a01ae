//! Proof CLI - Command-line interface for the your.fun proof-of-human collector
//!
//! Commands:
//! - fingerprint: Replay recorded interactions and print the fingerprint
//! - nonce: Generate a challenge nonce
//! - solve: Solve a challenge for a fingerprint hash
//! - verify: Check a challenge response
//! - doctor: Run self-checks against the reference fixtures

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use yourfun_proof::schema::{parse_records, recorded_span_ms};
use yourfun_proof::submission::decode_block;
use yourfun_proof::{
    behavioral_score, compute_challenge_hash, generate_challenge_nonce, verify_challenge_response,
    FingerprintResult, ManualClock, ProofConfig, ProofError, ProofGenerator, PRODUCER_NAME,
    PROOF_VERSION,
};

/// Proof - behavioral fingerprinting and challenge solving for your.fun
#[derive(Parser)]
#[command(name = "proof")]
#[command(author = "your.fun")]
#[command(version = PROOF_VERSION)]
#[command(about = "Generate proof-of-human fingerprints and solve verification challenges", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded interactions (NDJSON or JSON array) and print the fingerprint
    Fingerprint {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Session length in ms (defaults to the span covered by the records)
        #[arg(long)]
        session_duration_ms: Option<f64>,

        /// Readiness thresholds as a JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Also solve this hex challenge nonce against the fingerprint
        #[arg(long)]
        nonce: Option<String>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Generate a random challenge nonce (hex)
    Nonce,

    /// Solve a challenge for a fingerprint hash
    Solve {
        /// Challenge nonce (64 hex chars)
        #[arg(long)]
        nonce: String,

        /// Fingerprint hash (64 hex chars)
        #[arg(long)]
        hash: String,
    },

    /// Check a challenge response against a nonce and fingerprint hash
    Verify {
        #[arg(long)]
        nonce: String,

        #[arg(long)]
        hash: String,

        #[arg(long)]
        response: String,
    },

    /// Run self-checks
    Doctor {
        /// Output report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ProofCliError> {
    match cli.command {
        Commands::Fingerprint {
            input,
            session_duration_ms,
            config,
            nonce,
            pretty,
        } => cmd_fingerprint(
            &input,
            session_duration_ms,
            config.as_deref(),
            nonce.as_deref(),
            pretty,
        ),
        Commands::Nonce => {
            println!("{}", hex::encode(generate_challenge_nonce()));
            Ok(())
        }
        Commands::Solve { nonce, hash } => {
            let nonce = decode_block("nonce", &nonce)?;
            let hash = decode_block("fingerprint hash", &hash)?;
            println!("{}", hex::encode(compute_challenge_hash(&nonce, &hash)));
            Ok(())
        }
        Commands::Verify {
            nonce,
            hash,
            response,
        } => cmd_verify(&nonce, &hash, &response),
        Commands::Doctor { json } => cmd_doctor(json),
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct FingerprintReport {
    #[serde(flatten)]
    fingerprint: FingerprintResult,
    behavioral_score: u8,
    ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    challenge_response: Option<String>,
}

fn cmd_fingerprint(
    input: &Path,
    session_duration_ms: Option<f64>,
    config: Option<&Path>,
    nonce: Option<&str>,
    pretty: bool,
) -> Result<(), ProofCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let config = match config {
        Some(path) => ProofConfig::from_json(&fs::read_to_string(path)?)?,
        None => ProofConfig::default(),
    };

    let records = parse_records(&input_data)?;
    let (start, end) = recorded_span_ms(&records).ok_or(ProofCliError::NoEvents)?;

    // Replay on a manual clock so the session length comes from the recording
    let clock = ManualClock::new(start);
    let mut generator = ProofGenerator::with_clock(clock.clone(), config)?;
    for record in &records {
        record.apply(&mut generator);
    }
    clock.set(start + session_duration_ms.unwrap_or(end - start));

    let fingerprint = generator.generate_fingerprint();
    let challenge_response = match nonce {
        Some(nonce) => {
            let nonce = decode_block("nonce", nonce)?;
            Some(hex::encode(compute_challenge_hash(&nonce, &fingerprint.hash)))
        }
        None => None,
    };

    let report = FingerprintReport {
        behavioral_score: behavioral_score(fingerprint.confidence),
        ready: generator.is_ready(),
        fingerprint,
        challenge_response,
    };

    if pretty {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", serde_json::to_string(&report)?);
    }
    Ok(())
}

fn cmd_verify(nonce: &str, hash: &str, response: &str) -> Result<(), ProofCliError> {
    let nonce = decode_block("nonce", nonce)?;
    let hash = decode_block("fingerprint hash", hash)?;
    let response = decode_block("challenge response", response)?;

    if verify_challenge_response(&nonce, &hash, &response)? {
        println!("match");
        Ok(())
    } else {
        Err(ProofCliError::ChallengeMismatch)
    }
}

/// Reference output for nonce = [0; 32], hash = [0, 1, .., 31]
const CONFORMANCE_FIXTURE: &str = "5f02ce8a92ec5658 307a68827e447640 3872b0ba966cfee8 706a18d2ee8cae31";

fn cmd_doctor(json: bool) -> Result<(), ProofCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} {}", PRODUCER_NAME, PROOF_VERSION),
    });

    let fixture_hash: [u8; 32] = std::array::from_fn(|i| i as u8);
    let solved = hex::encode(compute_challenge_hash(&[0u8; 32], &fixture_hash));
    let expected: String = CONFORMANCE_FIXTURE.split_whitespace().collect();
    checks.push(if solved == expected {
        DoctorCheck {
            name: "challenge".to_string(),
            status: CheckStatus::Ok,
            message: "Challenge solver matches the reference fixture".to_string(),
        }
    } else {
        DoctorCheck {
            name: "challenge".to_string(),
            status: CheckStatus::Error,
            message: format!("Challenge solver produced {solved}, expected {expected}"),
        }
    });

    let (a, b) = (generate_challenge_nonce(), generate_challenge_nonce());
    checks.push(if a != b {
        DoctorCheck {
            name: "entropy".to_string(),
            status: CheckStatus::Ok,
            message: "OS random source is producing distinct nonces".to_string(),
        }
    } else {
        DoctorCheck {
            name: "entropy".to_string(),
            status: CheckStatus::Error,
            message: "OS random source returned identical nonces".to_string(),
        }
    });

    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: if atty::is(atty::Stream::Stdin) {
            "stdin is a TTY (pass --input <file>)".to_string()
        } else {
            "stdin is a pipe (--input - ready)".to_string()
        },
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: PROOF_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Proof Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(ProofCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum ProofCliError {
    Io(io::Error),
    Proof(ProofError),
    Json(serde_json::Error),
    NoEvents,
    ChallengeMismatch,
    DoctorFailed,
}

impl From<io::Error> for ProofCliError {
    fn from(e: io::Error) -> Self {
        ProofCliError::Io(e)
    }
}

impl From<ProofError> for ProofCliError {
    fn from(e: ProofError) -> Self {
        ProofCliError::Proof(e)
    }
}

impl From<serde_json::Error> for ProofCliError {
    fn from(e: serde_json::Error) -> Self {
        ProofCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<ProofCliError> for CliError {
    fn from(e: ProofCliError) -> Self {
        match e {
            ProofCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            ProofCliError::Proof(e @ ProofError::InvalidLength { .. })
            | ProofCliError::Proof(e @ ProofError::InvalidHex(_)) => CliError {
                code: "INVALID_BLOCK".to_string(),
                message: e.to_string(),
                hint: Some("Nonces, hashes and responses are 32 bytes (64 hex chars)".to_string()),
            },
            ProofCliError::Proof(e @ ProofError::ConfigError(_)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the --config file".to_string()),
            },
            ProofCliError::Proof(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Each record needs a kind of keystroke, mouse, scroll, focus or idle".to_string()),
            },
            ProofCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            ProofCliError::NoEvents => CliError {
                code: "NO_EVENTS".to_string(),
                message: "No interaction records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            ProofCliError::ChallengeMismatch => CliError {
                code: "CHALLENGE_MISMATCH".to_string(),
                message: "Challenge response does not match the nonce and fingerprint".to_string(),
                hint: None,
            },
            ProofCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Error,
}
