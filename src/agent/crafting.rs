//! Crafting cycle interpreter.
//!
//! Executes the configured cycle's steps in strict order, wrapping back
//! to step 0 after the last one, for as long as the agent runs. A failing
//! step is retried in place: the position only advances on success.

use crate::error::AgentError;
use crate::model::{Character, CraftingCycle, CraftingStep, Station};
use crate::settings::INVENTORY_THRESHOLD;

use super::Agent;

/// Cycle execution state, owned by one loop invocation.
pub(crate) struct CycleRunner {
    cycle: CraftingCycle,
    current: usize,
}

impl CycleRunner {
    pub fn new(cycle: CraftingCycle) -> Self {
        Self { cycle, current: 0 }
    }

    /// Progress through the current pass, as a floored percentage.
    fn progress(&self) -> u8 {
        if self.cycle.steps.is_empty() {
            return 0;
        }
        (self.current * 100 / self.cycle.steps.len()) as u8
    }

    /// Execute one step against a freshly fetched character.
    ///
    /// A full inventory preempts the step: the agent banks everything and
    /// the cycle position stays where it was.
    pub async fn step(&mut self, agent: &Agent, character: &Character) -> Result<(), AgentError> {
        if self.cycle.steps.is_empty() {
            return Err(AgentError::EmptyCycle {
                name: self.cycle.name.clone(),
            });
        }

        if character.inventory_total() >= INVENTORY_THRESHOLD {
            return agent.bank_inventory(character).await;
        }

        let step = self.cycle.steps[self.current].clone();
        match self.execute(agent, character, &step).await {
            Ok(()) => {
                self.current += 1;
                if self.current >= self.cycle.steps.len() {
                    // Pass complete: reset just before restarting at 0.
                    self.current = 0;
                }
                let progress = self.progress();
                agent
                    .publish(|s| {
                        if let Some(crafting) = s.crafting.as_mut() {
                            crafting.cycle_progress = progress;
                        }
                    })
                    .await;
                Ok(())
            }
            Err(e) => {
                agent
                    .publish(|s| {
                        if let Some(crafting) = s.crafting.as_mut() {
                            crafting.crafts_failed += 1;
                        }
                    })
                    .await;
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        agent: &Agent,
        character: &Character,
        step: &CraftingStep,
    ) -> Result<(), AgentError> {
        let name = &agent.config.character;
        match step {
            CraftingStep::Withdraw { item, quantity } => {
                agent
                    .move_if_needed(character, Station::Bank.position())
                    .await?;
                let outcome = agent.api.withdraw(name, item, *quantity).await?;
                agent
                    .publish(|s| {
                        if let Some(crafting) = s.crafting.as_mut() {
                            *crafting.consumed.entry(item.clone()).or_insert(0) +=
                                u64::from(*quantity);
                        }
                        s.last_action = format!("Withdrew {quantity} {item}");
                        s.last_error = None;
                    })
                    .await;
                agent.wait_cooldown(outcome.cooldown).await;
            }
            CraftingStep::Deposit { item, quantity } => {
                agent
                    .move_if_needed(character, Station::Bank.position())
                    .await?;
                let outcome = agent.api.deposit(name, item, *quantity).await?;
                agent
                    .publish(|s| {
                        if let Some(crafting) = s.crafting.as_mut() {
                            *crafting.crafted.entry(item.clone()).or_insert(0) +=
                                u64::from(*quantity);
                        }
                        s.last_action = format!("Deposited {quantity} {item}");
                        s.last_error = None;
                    })
                    .await;
                agent.wait_cooldown(outcome.cooldown).await;
            }
            CraftingStep::Craft { item, quantity } => {
                // No implicit move: a prior move step brings the agent to
                // the right station.
                let outcome = agent.api.craft(name, item, *quantity).await?;
                agent.log(format!("Crafted {quantity} {item}"));
                agent
                    .publish(|s| {
                        if let Some(crafting) = s.crafting.as_mut() {
                            crafting.crafts_completed += 1;
                        }
                        s.last_action = format!("Crafted {quantity} {item}");
                        s.last_error = None;
                    })
                    .await;
                agent.wait_cooldown(outcome.cooldown).await;
            }
            CraftingStep::Move { target } => {
                let position = target.position();
                agent.move_if_needed(character, position).await?;
                agent
                    .publish(|s| {
                        s.last_action = format!("Moved to {position}");
                        s.last_error = None;
                    })
                    .await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{character, config, harness, slots};
    use super::*;
    use crate::api::mock::Call;
    use crate::model::{ActionKind, MoveTarget};

    fn copper_cycle() -> CraftingCycle {
        CraftingCycle {
            id: "copper-bars".to_string(),
            name: "Copper bars".to_string(),
            steps: vec![
                CraftingStep::Withdraw {
                    item: "copper_ore".to_string(),
                    quantity: 8,
                },
                CraftingStep::Move {
                    target: MoveTarget::Station(Station::Mining),
                },
                CraftingStep::Craft {
                    item: "copper_bar".to_string(),
                    quantity: 1,
                },
                CraftingStep::Deposit {
                    item: "copper_bar".to_string(),
                    quantity: 1,
                },
            ],
        }
    }

    fn craft_config() -> crate::model::AgentConfig {
        let mut cfg = config(ActionKind::Craft);
        cfg.cycle = Some(copper_cycle());
        cfg
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_advances_and_wraps() {
        let h = harness(craft_config());
        h.api
            .set_characters(vec![character("Atlas", 100, 100, 4, 1)]);

        let mut runner = Some(CycleRunner::new(copper_cycle()));
        let expected = [25u8, 50, 75, 0];
        for (i, want) in expected.iter().enumerate() {
            h.agent.tick(&mut runner).await.unwrap();
            let status = h.agent.status().await;
            let crafting = status.crafting.expect("craft agent has crafting stats");
            assert_eq!(crafting.cycle_progress, *want, "after step {}", i + 1);
        }

        // A full pass wraps the index back to the first step.
        assert_eq!(runner.unwrap().current, 0);

        let status = h.agent.status().await;
        let crafting = status.crafting.unwrap();
        assert_eq!(crafting.crafts_completed, 1);
        assert_eq!(crafting.consumed.get("copper_ore"), Some(&8));
        assert_eq!(crafting.crafted.get("copper_bar"), Some(&1));
        assert_eq!(crafting.crafts_failed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_step_does_not_advance() {
        let h = harness(craft_config());
        // Standing at the mining station with the ore already withdrawn.
        h.api
            .set_characters(vec![character("Atlas", 100, 100, 1, 5)]);
        h.api.set_craft_fails(true);

        let mut runner = Some(CycleRunner::new(copper_cycle()));
        // Steps 1 and 2 (withdraw at bank, move to mining) succeed.
        h.agent.tick(&mut runner).await.unwrap();
        h.agent.tick(&mut runner).await.unwrap();
        assert_eq!(runner.as_ref().unwrap().current, 2);

        // The craft step fails and is retried in place.
        for attempt in 1..=2u64 {
            let err = h.agent.tick(&mut runner).await.unwrap_err();
            assert!(matches!(err, AgentError::Api(_)));
            assert_eq!(runner.as_ref().unwrap().current, 2);
            let crafting = h.agent.status().await.crafting.unwrap();
            assert_eq!(crafting.crafts_failed, attempt);
        }

        // Once the failure clears, the same step completes and advances.
        h.api.set_craft_fails(false);
        h.agent.tick(&mut runner).await.unwrap();
        assert_eq!(runner.as_ref().unwrap().current, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_inventory_preempts_without_losing_position() {
        let h = harness(craft_config());
        let mut c = character("Atlas", 100, 100, 1, 5);
        c.inventory = slots(&[("copper_bar", 100)]);
        h.api.set_characters(vec![c]);

        let mut runner = Some(CycleRunner::new(copper_cycle()));
        // Put the runner mid-cycle first.
        runner.as_mut().unwrap().current = 2;

        h.agent.tick(&mut runner).await.unwrap();

        // Banked instead of crafting; the cycle position is untouched.
        let calls = h.api.calls();
        assert!(!calls.iter().any(|c| matches!(c, Call::Craft { .. })));
        assert!(calls.iter().any(|c| matches!(c, Call::Deposit { .. })));
        assert_eq!(runner.unwrap().current, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_withdraw_moves_to_bank_first() {
        let h = harness(craft_config());
        h.api
            .set_characters(vec![character("Atlas", 100, 100, 0, 0)]);

        let mut runner = Some(CycleRunner::new(copper_cycle()));
        h.agent.tick(&mut runner).await.unwrap();

        let calls = h.api.calls();
        assert_eq!(
            calls[1],
            Call::Move {
                name: "Atlas".to_string(),
                position: Station::Bank.position(),
            }
        );
        assert!(matches!(calls[2], Call::Withdraw { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_cycle_is_a_configuration_error() {
        let mut cfg = config(ActionKind::Craft);
        cfg.cycle = Some(CraftingCycle {
            id: "empty".to_string(),
            name: "Empty".to_string(),
            steps: vec![],
        });
        let h = harness(cfg.clone());
        h.api
            .set_characters(vec![character("Atlas", 100, 100, 0, 0)]);

        let mut runner = cfg.cycle.map(CycleRunner::new);
        let err = h.agent.tick(&mut runner).await.unwrap_err();
        assert!(matches!(err, AgentError::EmptyCycle { .. }));
    }
}
