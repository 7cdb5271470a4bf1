//! ZK Private Lending demo
//!
//! Provisions the verifier with freshly generated keys, then walks two
//! positions through the pool: one full lifecycle (deposit, borrow,
//! partial and full repay, withdraw) and one liquidation after a price drop.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zk_lending_arkworks::{Opening, PositionOpening, ProofRequest, ZkVerifier, PRICE_SCALE};
use zk_lending_protocol::{
    Address, BorrowRequest, Commitment, CommitmentRegistry, Config, DebtRemainder, LendingPool,
    Nullifier, ProverService, RepayRequest, WithdrawRequest,
};

const DAY: u64 = 24 * 60 * 60;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zk_lending_protocol=info,zk_lending_arkworks=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ZK Private Lending");

    let config = Config::from_env()?;
    info!(environment = ?config.environment, "Configuration loaded");

    let service = ProverService::new(config.rng_seed);
    let mut verifier = ZkVerifier::new();
    service.provision(&mut verifier).await?;
    info!("Verification keys installed");

    let mut rng = match config.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let hasher = service.hasher();
    let pool_config = config.pool_config();

    let mut registry = CommitmentRegistry::new();
    let mut pool = LendingPool::new(&mut registry, &verifier, pool_config, 0);

    // amounts are in quote units; the collateral asset starts at 1.00
    pool.update_price(PRICE_SCALE, 0)?;

    // ======== Full lifecycle ========
    let carol = Address::from_label("carol");

    let collateral = Opening::random(20_000, &mut rng);
    let collateral_commitment = Commitment::from(collateral.commitment(hasher));
    let proof = service
        .generate(ProofRequest::Collateral {
            collateral,
            threshold: pool_config.min_collateral,
        })
        .await?;
    pool.deposit(carol, collateral_commitment, &proof, 0)?;

    let debt = Opening::random(10_000, &mut rng);
    let position = PositionOpening::random(collateral.value, debt.value, &mut rng);
    let ltv_proof = service
        .generate(ProofRequest::Ltv {
            collateral,
            debt,
            max_ltv: pool_config.max_ltv,
        })
        .await?;
    pool.borrow(
        carol,
        &BorrowRequest {
            amount: 10_000,
            debt_commitment: Commitment::from(debt.commitment(hasher)),
            debt_salt: debt.salt,
            position_hash: Commitment::from(position.hash(hasher)),
            ltv_proof,
        },
        60,
    )?;

    let now = 30 * DAY;
    let remaining = u64::try_from(pool.current_debt(&carol, now))? - 4_000;
    let debt = Opening::random(remaining, &mut rng);
    let position = PositionOpening::random(collateral.value, remaining, &mut rng);
    let ltv_proof = service
        .generate(ProofRequest::Ltv {
            collateral,
            debt,
            max_ltv: pool_config.max_ltv,
        })
        .await?;
    pool.repay(
        carol,
        &RepayRequest {
            amount: 4_000,
            nullifier: Nullifier::random(&mut rng),
            remainder: Some(DebtRemainder {
                debt_commitment: Commitment::from(debt.commitment(hasher)),
                debt_salt: debt.salt,
                position_hash: Commitment::from(position.hash(hasher)),
                ltv_proof,
            }),
        },
        now,
    )?;

    let now = 60 * DAY;
    let outstanding = pool.current_debt(&carol, now);
    pool.repay(
        carol,
        &RepayRequest {
            amount: outstanding,
            nullifier: Nullifier::random(&mut rng),
            remainder: None,
        },
        now,
    )?;

    let opening_proof = service
        .generate(ProofRequest::Collateral {
            collateral,
            threshold: 0,
        })
        .await?;
    pool.withdraw(
        carol,
        &WithdrawRequest {
            nullifier: Nullifier::random(&mut rng),
            collateral_proof: opening_proof,
            remainder: None,
        },
        now,
    )?;
    info!(user = %carol, interest_paid = %(outstanding + 4_000 - 10_000), "Position closed");

    // ======== Liquidation ========
    let dave = Address::from_label("dave");
    let keeper = Address::from_label("keeper");

    let collateral = Opening::random(10_000, &mut rng);
    let proof = service
        .generate(ProofRequest::Collateral {
            collateral,
            threshold: pool_config.min_collateral,
        })
        .await?;
    pool.deposit(dave, Commitment::from(collateral.commitment(hasher)), &proof, now)?;

    let debt = Opening::random(7_000, &mut rng);
    let position = PositionOpening::random(collateral.value, debt.value, &mut rng);
    let ltv_proof = service
        .generate(ProofRequest::Ltv {
            collateral,
            debt,
            max_ltv: pool_config.max_ltv,
        })
        .await?;
    pool.borrow(
        dave,
        &BorrowRequest {
            amount: 7_000,
            debt_commitment: Commitment::from(debt.commitment(hasher)),
            debt_salt: debt.salt,
            position_hash: Commitment::from(position.hash(hasher)),
            ltv_proof,
        },
        now,
    )?;

    let now = now + DAY;
    pool.update_price(80 * PRICE_SCALE / 100, now)?;

    // the keeper has been handed the position opening
    let liquidation_proof = service
        .generate(ProofRequest::Liquidation {
            position,
            price: pool.price(),
            liquidation_threshold: pool_config.liquidation_threshold,
        })
        .await?;
    pool.liquidate(keeper, dave, Nullifier::random(&mut rng), &liquidation_proof, now)?;

    println!("{}", serde_json::to_string_pretty(&pool.status())?);
    println!("{}", serde_json::to_string_pretty(pool.events())?);
    Ok(())
}
