use arcade::game::{new_instance, GameInput, GameOptions, GameType, RenderState};
use arcade::SessionError;

use super::setup::TestSetup;

// ============================================================================
// Player Actions
// ============================================================================

impl TestSetup {
    pub async fn start_game(
        &self,
        player_id: &str,
        game_type: GameType,
    ) -> Result<RenderState, SessionError> {
        let instance = new_instance(game_type, player_id, &GameOptions::default())?;
        self.registry.create_session(instance).await
    }

    pub async fn place(&self, session_id: &str, cell: usize) -> Result<RenderState, SessionError> {
        self.registry
            .process_input(
                session_id,
                &GameInput::Place {
                    cell,
                    player_id: None,
                },
            )
            .await
    }

    /// Plays the X fork that beats the CPU; returns every render along the way
    pub async fn play_winning_tic_tac_toe(&self, session_id: &str) -> Vec<RenderState> {
        let mut renders = Vec::new();
        for cell in [0, 8, 6, 3] {
            renders.push(
                self.place(session_id, cell)
                    .await
                    .expect("winning move should be legal"),
            );
        }
        renders
    }
}
