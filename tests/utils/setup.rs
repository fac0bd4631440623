use std::sync::Arc;
use std::time::Duration;

use arcade::players::{InMemoryPlayerRepository, PlayerProfile};
use arcade::rewards::{RewardApplier, RewardCalculator, RewardConfig};
use arcade::session::{InMemorySessionRepository, SweepConfig};
use arcade::SessionRegistry;

use super::mocks::{MockAchievementEvaluator, MockLedger};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub registry: Arc<SessionRegistry>,
    pub sessions: Arc<InMemorySessionRepository>,
    pub players: Arc<InMemoryPlayerRepository>,
    pub ledger: MockLedger,
    pub achievements: MockAchievementEvaluator,
}

impl TestSetup {
    /// A second registry over the same store, as after a process restart
    pub fn restarted(&self) -> Arc<SessionRegistry> {
        let rewards = RewardApplier::new(
            RewardCalculator::default(),
            self.players.clone(),
            Arc::new(self.ledger.clone()),
            Arc::new(self.achievements.clone()),
        );
        Arc::new(SessionRegistry::new(
            self.sessions.clone(),
            rewards,
            self.registry.sweep_config(),
        ))
    }
}

pub struct TestSetupBuilder {
    ledger: MockLedger,
    rewards: RewardConfig,
    sweep: SweepConfig,
    profiles: Vec<PlayerProfile>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            ledger: MockLedger::new(),
            rewards: RewardConfig::default(),
            sweep: SweepConfig::default(),
            profiles: Vec::new(),
        }
    }

    pub fn with_failing_ledger(mut self) -> Self {
        self.ledger = MockLedger::failing();
        self
    }

    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.sweep.session_timeout = timeout;
        self
    }

    pub fn with_profile(mut self, profile: PlayerProfile) -> Self {
        self.profiles.push(profile);
        self
    }

    pub async fn build(self) -> TestSetup {
        let sessions = Arc::new(InMemorySessionRepository::new());
        let players = Arc::new(InMemoryPlayerRepository::new());
        for profile in self.profiles {
            players.upsert_profile(profile).await;
        }
        let achievements = MockAchievementEvaluator::new();

        let rewards = RewardApplier::new(
            RewardCalculator::new(self.rewards),
            players.clone(),
            Arc::new(self.ledger.clone()),
            Arc::new(achievements.clone()),
        );
        let registry = Arc::new(SessionRegistry::new(sessions.clone(), rewards, self.sweep));

        TestSetup {
            registry,
            sessions,
            players,
            ledger: self.ledger,
            achievements,
        }
    }
}
