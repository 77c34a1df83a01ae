//! Replay a short recorded session and print the fingerprint plus a challenge response

use yourfun_proof::{ManualClock, ProofConfig, ProofError, ProofGenerator};

fn main() -> Result<(), ProofError> {
    let records = r#"
{"kind":"keystroke","down":0.0,"up":85.0}
{"kind":"keystroke","down":210.0,"up":260.0}
{"kind":"keystroke","down":590.0,"up":655.0}
{"kind":"mouse","x":10.0,"y":12.0,"t":700.0}
{"kind":"mouse","x":64.0,"y":40.0,"t":716.0}
{"kind":"mouse","x":180.0,"y":95.0,"t":733.0}
{"kind":"scroll","delta_y":120.0,"t":900.0}
{"kind":"scroll","delta_y":-40.0,"t":1300.0}
{"kind":"scroll","delta_y":360.0,"t":1800.0}
{"kind":"focus","has_focus":false,"t":2500.0}
{"kind":"focus","has_focus":true,"t":4100.0}
{"kind":"idle","start":4200.0,"end":7200.0}
"#;

    let parsed = yourfun_proof::schema::parse_records(records)?;

    let clock = ManualClock::new(0.0);
    let mut generator = ProofGenerator::with_clock(clock.clone(), ProofConfig::default())?;
    for record in &parsed {
        record.apply(&mut generator);
    }
    clock.set(12_000.0);

    let fingerprint = generator.generate_fingerprint();
    let nonce = generator.generate_challenge_nonce();
    let response = generator.solve_challenge(&nonce, &fingerprint.hash)?;

    println!("fingerprint: {}", fingerprint.hash_hex());
    println!("confidence:  {}", fingerprint.confidence);
    println!("ready:       {}", generator.is_ready());
    println!("nonce:       {}", hex::encode(nonce));
    println!("response:    {}", hex::encode(response));
    Ok(())
}
