//! Async façade over the pipeline port.
//!
//! A single tokio task owns the pipeline state; the front end posts
//! bounded `PipelineCommand` messages and receives one `PipelineEvent` per
//! command, in posting order. Control yields between stages, never
//! mid-stage. Dropping the command sender (or the event receiver) shuts
//! the worker down cooperatively; in-progress state is simply abandoned.

use ports::primary::pipeline_port::{PipelineCommand, PipelineEvent, PolicyPipelinePort};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Channel ends of a spawned pipeline worker.
pub struct PipelineHandle {
    pub commands: mpsc::Sender<PipelineCommand>,
    pub events: mpsc::Receiver<PipelineEvent>,
    pub task: JoinHandle<()>,
}

/// Spawn the worker task around an owned pipeline port.
pub fn spawn_pipeline<P>(mut port: P, capacity: usize) -> PipelineHandle
where
    P: PolicyPipelinePort + Send + 'static,
{
    let (command_tx, mut command_rx) = mpsc::channel::<PipelineCommand>(capacity);
    let (event_tx, event_rx) = mpsc::channel::<PipelineEvent>(capacity);

    let task = tokio::spawn(async move {
        while let Some(command) = command_rx.recv().await {
            let event = run_stage(&mut port, command);
            if event_tx.send(event).await.is_err() {
                tracing::debug!("event receiver dropped, stopping pipeline worker");
                break;
            }
        }
    });

    PipelineHandle {
        commands: command_tx,
        events: event_rx,
        task,
    }
}

fn run_stage<P: PolicyPipelinePort>(port: &mut P, command: PipelineCommand) -> PipelineEvent {
    match command {
        PipelineCommand::MakeList { config_text } => {
            PipelineEvent::ListMade(port.make_list(&config_text))
        }
        PipelineCommand::Normalize => PipelineEvent::Normalized(port.normalize()),
        PipelineCommand::Flatten {
            flatten_addresses,
            flatten_services,
        } => PipelineEvent::Flattened(port.flatten(flatten_addresses, flatten_services)),
        PipelineCommand::Lookup {
            list_text,
            fqdn_geo_match_all,
        } => PipelineEvent::LookedUp(port.lookup(&list_text, fqdn_geo_match_all)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline_service_impl::PolicyPipelineService;

    const CFG: &str = "config firewall address\n\
        edit \"LAN\"\nset subnet 10.0.0.0 255.0.0.0\nnext\nend\n\
        config firewall service custom\n\
        edit \"ALL\"\nset protocol IP\nnext\nend\n\
        config firewall policy\n\
        edit 1\nset srcintf \"in\"\nset dstintf \"out\"\n\
        set srcaddr \"LAN\"\nset dstaddr \"LAN\"\nset action accept\n\
        set service \"ALL\"\nnext\nend\n";

    #[tokio::test]
    async fn events_arrive_in_posting_order() {
        let mut handle = spawn_pipeline(PolicyPipelineService::new(), 8);

        handle
            .commands
            .send(PipelineCommand::MakeList {
                config_text: CFG.to_string(),
            })
            .await
            .unwrap();
        handle.commands.send(PipelineCommand::Normalize).await.unwrap();
        handle
            .commands
            .send(PipelineCommand::Flatten {
                flatten_addresses: true,
                flatten_services: true,
            })
            .await
            .unwrap();
        handle
            .commands
            .send(PipelineCommand::Lookup {
                list_text: "10.1.2.3,\n".to_string(),
                fqdn_geo_match_all: false,
            })
            .await
            .unwrap();

        assert!(matches!(
            handle.events.recv().await,
            Some(PipelineEvent::ListMade(_))
        ));
        assert!(matches!(
            handle.events.recv().await,
            Some(PipelineEvent::Normalized(_))
        ));
        let Some(PipelineEvent::Flattened(text)) = handle.events.recv().await else {
            panic!("expected Flattened");
        };
        assert!(text.contains("10.0.0.0/8"));
        let Some(PipelineEvent::LookedUp(out)) = handle.events.recv().await else {
            panic!("expected LookedUp");
        };
        assert!(out.all.starts_with("from_10.1.2.3/32,"));

        drop(handle.commands);
        handle.task.await.unwrap();
    }

    #[tokio::test]
    async fn out_of_order_lookup_runs_against_empty_state() {
        let mut handle = spawn_pipeline(PolicyPipelineService::new(), 4);
        handle
            .commands
            .send(PipelineCommand::Lookup {
                list_text: "10.1.2.3,\n".to_string(),
                fqdn_geo_match_all: false,
            })
            .await
            .unwrap();
        let Some(PipelineEvent::LookedUp(out)) = handle.events.recv().await else {
            panic!("expected LookedUp");
        };
        assert!(out.all.is_empty());
        drop(handle.commands);
        handle.task.await.unwrap();
    }

    #[tokio::test]
    async fn closing_the_command_channel_stops_the_worker() {
        let handle = spawn_pipeline(PolicyPipelineService::new(), 4);
        drop(handle.commands);
        handle.task.await.unwrap();
    }
}
