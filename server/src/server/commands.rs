// bow_arena/server/src/server/commands.rs
//
// Client command handlers. Clients are authoritative for arrow flight and hit
// detection; the server keeps the ammunition and score bookkeeping.

use super::instance::ArenaServer;
use crate::core::types::{EntityId, GameCommand};
use crate::host::GameHost;
use tracing::{debug, trace};

impl<H: GameHost> ArenaServer<H> {
    /// Handles a command received from `sender`. Returns whether it was accepted.
    pub fn handle_command(&self, sender: EntityId, command: GameCommand) -> bool {
        let host = self.host.as_ref();
        trace!("Command {} from {}", command.kind(), sender);

        match command {
            GameCommand::Arrow { .. } => {
                let Some(mut record) = host.player_record(sender) else {
                    debug!("Arrow from {} rejected: no player record", sender);
                    return false;
                };
                if record.arrow_count == 0 {
                    debug!("Arrow from {} rejected: quiver empty", sender);
                    return false;
                }
                record.arrow_count -= 1;
                host.set_player_record(sender, record);
                host.send_to_all(command, Some(sender));
                true
            }
            GameCommand::Hit { attacker_id, victim_id, .. } => {
                let now = host.world_time();
                self.respawn_manager.kill_player(host, victim_id, now);

                if attacker_id != victim_id {
                    if let Some(mut attacker) = host.player_record(attacker_id) {
                        attacker.kills += 1;
                        attacker.last_kill_time = now;
                        attacker.kill_streak += 1;
                        debug!("{} killed {} (streak {})", attacker.name, victim_id, attacker.kill_streak);
                        host.set_player_record(attacker_id, attacker);
                    }
                }
                host.send_to_all(command, None);
                true
            }
            GameCommand::EnvironmentalDeath { victim_id, ref reason } => {
                debug!("Player {} died to the environment: {}", victim_id, reason);
                self.respawn_manager.kill_player(host, victim_id, host.world_time());
                host.send_to_all(command, None);
                true
            }
            GameCommand::Respawn { .. } | GameCommand::Pickup { .. } | GameCommand::ItemSpawn { .. } => {
                debug!("Ignoring server-only command {} from {}", command.kind(), sender);
                false
            }
        }
    }
}
