use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{
    GameCore, GameError, GameInput, GameInstance, GameOptions, GameType, GameView, OutcomeDetails,
};

const DEFAULT_QUESTION_COUNT: usize = 5;
const POINTS_PER_CORRECT: i64 = 10;
const CORRECT_PER_LEVEL: u32 = 3;

struct Question {
    prompt: &'static str,
    choices: [&'static str; 4],
    answer: usize,
}

const QUESTION_BANK: &[Question] = &[
    Question {
        prompt: "Which faction tends the tidal archives beneath the harbour?",
        choices: ["Ember", "Tide", "Grove", "None of them"],
        answer: 1,
    },
    Question {
        prompt: "What do Ember smiths quench their blades in?",
        choices: ["Salt water", "Moss tea", "Cinder ash", "Molten flint"],
        answer: 2,
    },
    Question {
        prompt: "How many stones ring the Grove's founding circle?",
        choices: ["Three", "Seven", "Nine", "Twelve"],
        answer: 1,
    },
    Question {
        prompt: "Which resource is harvested only at low tide?",
        choices: ["Pearl", "Timber", "Flint", "Seed"],
        answer: 0,
    },
    Question {
        prompt: "Who is said to have lit the first neighbourhood lantern?",
        choices: ["The Cartographer", "The Lamplighter", "The Warden", "The Tinker"],
        answer: 1,
    },
    Question {
        prompt: "What grows on the roofs of Grove plots after the first rain?",
        choices: ["Kelp", "Moss", "Ash", "Salt"],
        answer: 1,
    },
    Question {
        prompt: "Which season opens the guild tournaments?",
        choices: ["Spring", "Summer", "Autumn", "Winter"],
        answer: 2,
    },
    Question {
        prompt: "What is traded to enter the Tide market?",
        choices: ["A kelp token", "A cinder coin", "A seed pouch", "Nothing"],
        answer: 0,
    },
    Question {
        prompt: "Which tower watches over every neighbourhood at once?",
        choices: ["The Spire of Ash", "The Lantern Tower", "The Drowned Bell", "The Old Oak"],
        answer: 1,
    },
    Question {
        prompt: "What do Ember scouts carry to start a camp fire?",
        choices: ["Pearl", "Moss", "Flint", "Timber"],
        answer: 2,
    },
    Question {
        prompt: "Where are forgotten plots said to drift?",
        choices: ["Into the sea", "Under the oak", "Beyond the ridge", "Into the ash fields"],
        answer: 0,
    },
    Question {
        prompt: "How many factions signed the founding accord?",
        choices: ["Two", "Three", "Four", "Five"],
        answer: 1,
    },
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Round {
    /// Indices into the question bank, in asking order
    order: Vec<usize>,
    current: usize,
    answered: u32,
    correct: u32,
    last_answer_correct: Option<bool>,
}

impl Round {
    fn current_question(&self) -> Option<&'static Question> {
        self.order
            .get(self.current)
            .and_then(|&index| QUESTION_BANK.get(index))
    }

    fn is_done(&self) -> bool {
        self.current >= self.order.len()
    }

    fn accuracy(&self) -> f64 {
        if self.answered == 0 {
            0.0
        } else {
            f64::from(self.correct) / f64::from(self.answered) * 100.0
        }
    }
}

/// Multiple-choice lore quiz
pub struct Trivia {
    core: GameCore,
    round: Round,
}

impl Default for Trivia {
    fn default() -> Self {
        Self::new()
    }
}

impl Trivia {
    pub fn new() -> Self {
        Self {
            core: GameCore::new(GameType::Trivia),
            round: Round::default(),
        }
    }

    pub fn bank_size() -> usize {
        QUESTION_BANK.len()
    }
}

impl GameInstance for Trivia {
    fn core(&self) -> &GameCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GameCore {
        &mut self.core
    }

    fn initialize(&mut self, player_id: &str, options: &GameOptions) -> Result<(), GameError> {
        let count = options.question_count.unwrap_or(DEFAULT_QUESTION_COUNT);
        if count == 0 || count > QUESTION_BANK.len() {
            return Err(GameError::InvalidOptions(format!(
                "question count must be between 1 and {}",
                QUESTION_BANK.len()
            )));
        }

        self.core.begin(player_id, 1)?;

        let mut rng = StdRng::seed_from_u64(options.seed.unwrap_or_else(rand::random));
        let mut order: Vec<usize> = (0..QUESTION_BANK.len()).collect();
        order.shuffle(&mut rng);
        order.truncate(count);

        self.round = Round {
            order,
            ..Round::default()
        };
        Ok(())
    }

    fn apply_input(&mut self, input: &GameInput) -> Result<(), GameError> {
        let choice = match input {
            GameInput::Answer { choice } => *choice,
            other => {
                return Err(GameError::InvalidInput(format!(
                    "trivia does not accept {:?}",
                    other
                )))
            }
        };

        let question = self
            .round
            .current_question()
            .ok_or_else(|| GameError::Fault("question index out of range".to_string()))?;
        if choice >= question.choices.len() {
            return Err(GameError::InvalidInput(format!(
                "choice {} does not exist",
                choice
            )));
        }

        let correct = choice == question.answer;
        self.round.answered += 1;
        self.round.current += 1;
        self.round.last_answer_correct = Some(correct);

        if correct {
            self.round.correct += 1;
            self.core.add_score(POINTS_PER_CORRECT)?;
            self.core
                .set_level(1 + self.round.correct / CORRECT_PER_LEVEL)?;
        }
        Ok(())
    }

    fn view(&self) -> GameView {
        let question = self.round.current_question();
        GameView::Trivia {
            question_number: (self.round.current + 1).min(self.round.order.len()),
            total_questions: self.round.order.len(),
            prompt: question.map(|q| q.prompt.to_string()),
            choices: question
                .map(|q| q.choices.iter().map(|c| c.to_string()).collect())
                .unwrap_or_default(),
            correct_answers: self.round.correct,
            last_answer_correct: self.round.last_answer_correct,
        }
    }

    fn is_finished(&self) -> bool {
        self.round.is_done()
    }

    fn summarize(&self) -> OutcomeDetails {
        let total = self.round.order.len() as u32;
        let mut extras = serde_json::Map::new();
        extras.insert("correct_answers".into(), self.round.correct.into());
        extras.insert("questions_answered".into(), self.round.answered.into());
        extras.insert("total_questions".into(), total.into());
        extras.insert(
            "perfect".into(),
            (total > 0 && self.round.correct == total).into(),
        );

        OutcomeDetails {
            accuracy: Some(self.round.accuracy()),
            completed: self.round.is_done(),
            won: total > 0 && self.round.correct * 2 >= total,
            extras,
        }
    }

    fn snapshot_data(&self) -> Result<serde_json::Value, GameError> {
        serde_json::to_value(&self.round).map_err(|e| GameError::Fault(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{EndReason, GameState};

    fn seeded(count: usize) -> Trivia {
        let mut game = Trivia::new();
        let options = GameOptions {
            question_count: Some(count),
            seed: Some(7),
            ..GameOptions::default()
        };
        game.initialize("alice", &options).unwrap();
        game
    }

    fn right_answer(game: &Trivia) -> usize {
        game.round.current_question().unwrap().answer
    }

    fn wrong_answer(game: &Trivia) -> usize {
        (right_answer(game) + 1) % 4
    }

    #[test]
    fn seed_fixes_question_order() {
        let first = seeded(5);
        let second = seeded(5);
        assert_eq!(first.round.order, second.round.order);
        assert_eq!(first.round.order.len(), 5);
    }

    #[test]
    fn rejects_bad_question_counts() {
        let mut game = Trivia::new();
        let options = GameOptions {
            question_count: Some(0),
            ..GameOptions::default()
        };
        assert!(matches!(
            game.initialize("alice", &options),
            Err(GameError::InvalidOptions(_))
        ));

        let options = GameOptions {
            question_count: Some(Trivia::bank_size() + 1),
            ..GameOptions::default()
        };
        assert!(game.initialize("alice", &options).is_err());
        assert_eq!(game.state(), GameState::Waiting);
    }

    #[test]
    fn scores_correct_answers_and_tracks_accuracy() {
        let mut game = seeded(4);

        for _ in 0..3 {
            let answer = right_answer(&game);
            game.process_input(&GameInput::Answer { choice: answer })
                .unwrap();
        }
        let answer = wrong_answer(&game);
        let render = game
            .process_input(&GameInput::Answer { choice: answer })
            .unwrap();

        assert!(render.finished);
        assert_eq!(render.score, 30);
        assert_eq!(render.level, 2);

        let outcome = game.end_game(EndReason::Completed).unwrap();
        assert_eq!(outcome.accuracy, Some(75.0));
        assert!(outcome.won);
        assert_eq!(outcome.extras["correct_answers"], 3);
    }

    #[test]
    fn out_of_range_choice_is_rejected_without_progress() {
        let mut game = seeded(2);
        assert!(matches!(
            game.process_input(&GameInput::Answer { choice: 4 }),
            Err(GameError::InvalidInput(_))
        ));
        assert_eq!(game.round.answered, 0);
    }

    #[test]
    fn paused_game_accepts_no_answers() {
        let mut game = seeded(2);
        game.core_mut().pause().unwrap();
        assert!(matches!(
            game.process_input(&GameInput::Answer { choice: 0 }),
            Err(GameError::InvalidInput(_))
        ));
        assert_eq!(game.round.current, 0);
    }

    #[test]
    fn end_game_is_idempotent() {
        let mut game = seeded(1);
        let answer = right_answer(&game);
        game.process_input(&GameInput::Answer { choice: answer })
            .unwrap();

        let first = game.end_game(EndReason::Completed).unwrap();
        let second = game.end_game(EndReason::Completed).unwrap();
        assert_eq!(first, second);
        assert_eq!(game.state(), GameState::Completed);
    }

    #[test]
    fn render_state_is_available_after_termination() {
        let mut game = seeded(2);
        game.end_game(EndReason::Abandoned).unwrap();

        let render = game.render_state();
        assert_eq!(render.state, GameState::Abandoned);
        assert!(render.ended_at.is_some());
        assert_eq!(game.render_state(), render);
    }
}
