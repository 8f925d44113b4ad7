//! FairDraw Demo
//!
//! Runs one competition period end to end: submits sessions (including a
//! cheater), closes the period, draws winners, and re-verifies every
//! published artifact the way an external auditor would.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use fairdraw::{
    game::moves::{MoveKind, MoveRecord},
    game::replay::replay,
    game::rules::{GameId, GameRules, RulesRegistry},
    raffle::{
        verify_inclusion, verify_vrf, LocalVrfOracle, PeriodConfig, PeriodStatus, RaffleEngine,
        VrfCoordinator, VrfKeypair, VrfOutput, VrfRetryConfig,
    },
    raffle::leaderboard::AcceptedSession,
    validate::session::{GameSession, SessionId, ValidationPolicy, WalletId},
    SessionPipeline, VERSION,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("FairDraw Engine v{}", VERSION);

    let registry = RulesRegistry::builtin();
    let rules = registry
        .get(GameId::GLYPH_STACKER)
        .context("built-in rules missing")?;
    let pipeline = SessionPipeline::new(ValidationPolicy::default());

    let keypair = VrfKeypair::from_seed_bytes([42; 32]);
    let oracle_public = keypair.public_key();
    let coordinator = VrfCoordinator::new(
        Arc::new(LocalVrfOracle::new(keypair)),
        oracle_public,
        VrfRetryConfig::default(),
    );
    let engine = RaffleEngine::new(coordinator, PeriodConfig::default());

    let period_id = 1;
    engine.open_period(period_id).await;

    // Honest players: claims computed by playing the moves out.
    let mut accepted = Vec::new();
    for (wallet_byte, seed) in [(1u8, 101u64), (2, 202), (3, 303), (4, 404), (5, 505)] {
        let session = honest_session(wallet_byte, seed, rules.as_ref())?;
        let record = pipeline.submit(&session)?;
        info!(
            wallet = %hex::encode(&session.wallet_id.0[..4]),
            verdict = ?record.verdict,
            score = session.claimed_score,
            "session submitted"
        );
        if record.verdict.is_accepted() {
            accepted.push(AcceptedSession {
                session_id: session.session_id,
                wallet_id: session.wallet_id,
                score: record.outcome.context("accepted without outcome")?.canonical_score,
                submitted_at: session.submitted_at,
            });
        }
    }

    // A cheater: same moves, inflated claim.
    let mut cheater = honest_session(6, 606, rules.as_ref())?;
    cheater.claimed_score += 9_999;
    let record = pipeline.submit(&cheater)?;
    warn!(
        wallet = %hex::encode(&cheater.wallet_id.0[..4]),
        verdict = ?record.verdict,
        "inflated claim rejected"
    );

    for session in &accepted {
        engine.record_accepted(period_id, *session).await?;
    }

    let snapshot = engine.close_period(period_id).await?;
    info!(
        status = ?snapshot.status,
        root = %hex::encode(snapshot.commitment.root),
        "period settled"
    );

    if snapshot.status != PeriodStatus::Drawn {
        anyhow::bail!("demo period settled {:?} without a draw", snapshot.status);
    }
    let draw = snapshot.draw.as_ref().context("drawn period missing draw")?;
    for (i, winner) in draw.winners.iter().enumerate() {
        info!(place = i + 1, wallet = %hex::encode(&winner.0[..4]), "winner");
    }

    // Audit pass: everything below uses only published data.
    let output = VrfOutput {
        seed: draw.vrf_seed,
        proof: draw.vrf_proof.clone(),
    };
    verify_vrf(&output, &oracle_public, period_id, &snapshot.commitment.root)
        .context("published vrf output failed verification")?;
    info!("vrf proof verified against commitment root");

    for allocation in snapshot.allocations.iter().filter(|a| a.ticket_count > 0) {
        let proof = engine
            .prove_inclusion(period_id, allocation.wallet_id)
            .await?
            .context("missing inclusion proof")?;
        if !verify_inclusion(&snapshot.commitment.root, &proof) {
            anyhow::bail!("inclusion proof failed for a committed wallet");
        }
    }
    info!("all ticket ranges carry valid inclusion proofs");

    println!("{}", serde_json::to_string_pretty(&*snapshot)?);
    Ok(())
}

/// Build a session whose claims match its canonical replay.
fn honest_session(wallet_byte: u8, seed: u64, rules: &dyn GameRules) -> Result<GameSession> {
    let mut moves = Vec::new();
    let mut at_ms = 0u64;
    for i in 0..24u64 {
        at_ms += 250 + (seed + i) % 200;
        let column = ((seed.wrapping_mul(31) + i * 7) % 8) as u8;
        moves.push(MoveRecord {
            at_ms,
            kind: MoveKind::Drop { column },
        });
    }

    let outcome = replay(seed, &moves, rules)?;
    Ok(GameSession {
        session_id: SessionId([wallet_byte; 16]),
        wallet_id: WalletId([wallet_byte; 16]),
        game_id: GameId::GLYPH_STACKER,
        seed,
        moves,
        claimed_score: outcome.canonical_score,
        claimed_stats: outcome.canonical_stats,
        submitted_at: Utc::now(),
    })
}
