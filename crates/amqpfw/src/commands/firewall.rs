//! Firewall command handlers.
//!
//! Each handler loads tracked state, runs one controller operation, and
//! writes the resulting resource back before printing it.

use std::path::Path;

use amqpfw_api::{ApiClient, Retrying};
use amqpfw_config::state;
use amqpfw_core::{DesiredFirewall, FirewallController, FirewallResource, FirewallRule};
use tabled::Tabled;

use crate::cli::{FirewallArgs, FirewallCommand, GlobalOpts, RulesFileArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

type Controller = FirewallController<Retrying<ApiClient>>;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Source")]
    ip: String,
    #[tabled(rename = "Services")]
    services: String,
    #[tabled(rename = "Ports")]
    ports: String,
    #[tabled(rename = "Description")]
    description: String,
}

fn rule_rows<'a>(rules: impl IntoIterator<Item = &'a FirewallRule>) -> Vec<RuleRow> {
    rules
        .into_iter()
        .enumerate()
        .map(|(index, r)| RuleRow {
            index: index + 1,
            ip: r.ip.clone(),
            services: join_or_dash(r.services.iter().map(ToString::to_string)),
            ports: join_or_dash(r.ports.iter().map(ToString::to_string)),
            description: r.description.clone().unwrap_or_else(|| "-".into()),
        })
        .collect()
}

fn join_or_dash(items: impl Iterator<Item = String>) -> String {
    let joined = items.collect::<Vec<_>>().join(", ");
    if joined.is_empty() { "-".into() } else { joined }
}

#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Instance")]
    instance_id: i64,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Rules")]
    rule_count: usize,
}

impl From<&FirewallResource> for ResourceRow {
    fn from(r: &FirewallResource) -> Self {
        Self {
            instance_id: r.instance_id,
            id: r.id.clone().unwrap_or_else(|| "-".into()),
            rule_count: r.rules.len(),
        }
    }
}

fn resource_detail(r: &FirewallResource) -> String {
    let header = format!(
        "Instance: {}\nID:       {}\nRules:    {}",
        r.instance_id,
        r.id.as_deref().unwrap_or("-"),
        r.rules.len()
    );
    if r.rules.is_empty() {
        return header;
    }
    format!(
        "{header}\n\n{}",
        output::render_table(&rule_rows(r.rules.sorted()))
    )
}

fn print_resource(resource: &FirewallResource, global: &GlobalOpts) {
    let out = output::render_single(global.output, resource, resource_detail, |r| {
        r.id.clone().unwrap_or_default()
    });
    output::print_output(&out, global.quiet);
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: FirewallArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let dir = config::state_dir(global);

    match args.command {
        FirewallCommand::Validate(RulesFileArgs { file }) => validate(&file, global),

        FirewallCommand::List => {
            let resources = state::list_states(&dir)?;
            let out = output::render_list(
                global.output,
                &resources,
                |r| ResourceRow::from(r),
                |r| r.instance_id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FirewallCommand::Show {
            instance_id,
            refresh,
        } => {
            let mut resource = tracked(&dir, instance_id)?;
            if refresh {
                let ctl = controller(global)?;
                ctl.read(&mut resource).await?;
                state::save_state(&dir, &resource)?;
            }
            print_resource(&resource, global);
            Ok(())
        }

        FirewallCommand::Create(RulesFileArgs { file }) => {
            let desired = util::read_rules_file(&file)?;
            if state::load_state(&dir, desired.instance_id)?.is_some() {
                return Err(CliError::AlreadyTracked {
                    instance_id: desired.instance_id,
                });
            }
            let ctl = controller(global)?;
            let resource = create(&ctl, &dir, &desired).await?;
            output::success(
                &format!("Firewall created for instance {}", resource.instance_id),
                global.quiet,
            );
            print_resource(&resource, global);
            Ok(())
        }

        FirewallCommand::Update(RulesFileArgs { file }) => {
            let desired = util::read_rules_file(&file)?;
            let mut resource = tracked(&dir, desired.instance_id)?;
            let ctl = controller(global)?;
            update(&ctl, &dir, &mut resource, &desired).await?;
            output::success(
                &format!("Firewall updated for instance {}", resource.instance_id),
                global.quiet,
            );
            print_resource(&resource, global);
            Ok(())
        }

        FirewallCommand::Apply(RulesFileArgs { file }) => {
            let desired = util::read_rules_file(&file)?;
            let ctl = controller(global)?;

            let Some(mut resource) = state::load_state(&dir, desired.instance_id)? else {
                let resource = create(&ctl, &dir, &desired).await?;
                output::success(
                    &format!("Firewall created for instance {}", resource.instance_id),
                    global.quiet,
                );
                print_resource(&resource, global);
                return Ok(());
            };

            ctl.read(&mut resource).await?;
            state::save_state(&dir, &resource)?;

            if resource.matches(&desired) {
                output::note(
                    &format!("No changes for instance {}", resource.instance_id),
                    global.quiet,
                );
            } else {
                update(&ctl, &dir, &mut resource, &desired).await?;
                output::success(
                    &format!("Firewall updated for instance {}", resource.instance_id),
                    global.quiet,
                );
            }
            print_resource(&resource, global);
            Ok(())
        }

        FirewallCommand::Delete { instance_id } => {
            let resource = tracked(&dir, instance_id)?;
            let prompt = format!(
                "Delete all {} firewall rules of instance {instance_id}?",
                resource.rules.len()
            );
            if !util::confirm(&prompt, global.yes, "firewall delete")? {
                output::note("Aborted", global.quiet);
                return Ok(());
            }

            let ctl = controller(global)?;
            ctl.delete(&resource).await?;
            state::remove_state(&dir, instance_id)?;
            output::success(
                &format!("Firewall deleted for instance {instance_id}"),
                global.quiet,
            );
            Ok(())
        }

        FirewallCommand::Import { id } => {
            let ctl = controller(global)?;
            let resource = ctl.import(&id).await?;
            state::save_state(&dir, &resource)?;
            output::success(
                &format!(
                    "Imported {} rules for instance {}",
                    resource.rules.len(),
                    resource.instance_id
                ),
                global.quiet,
            );
            print_resource(&resource, global);
            Ok(())
        }
    }
}

// ── Steps ───────────────────────────────────────────────────────────

fn controller(global: &GlobalOpts) -> Result<Controller, CliError> {
    let conn = config::resolve_connection(global)?;
    Ok(FirewallController::new(conn.client()?))
}

fn tracked(dir: &Path, instance_id: i64) -> Result<FirewallResource, CliError> {
    state::load_state(dir, instance_id)?.ok_or(CliError::NotTracked { instance_id })
}

/// Run Create and persist the result.
///
/// A resource that became Present is saved even when the follow-up Read
/// failed, so the instance stays tracked.
async fn create(
    ctl: &Controller,
    dir: &Path,
    desired: &DesiredFirewall,
) -> Result<FirewallResource, CliError> {
    let mut resource = FirewallResource::absent();
    let result = ctl.create(&mut resource, desired).await;
    if resource.is_present() {
        state::save_state(dir, &resource)?;
    }
    result?;
    Ok(resource)
}

async fn update(
    ctl: &Controller,
    dir: &Path,
    resource: &mut FirewallResource,
    desired: &DesiredFirewall,
) -> Result<(), CliError> {
    ctl.update(resource, desired).await?;
    state::save_state(dir, resource)?;
    Ok(())
}

fn validate(file: &Path, global: &GlobalOpts) -> Result<(), CliError> {
    let desired = util::read_rules_file(file)?;
    output::success(
        &format!(
            "{} rules valid for instance {}",
            desired.rules.len(),
            desired.instance_id
        ),
        global.quiet,
    );
    let out = output::render_single(
        global.output,
        &desired,
        |d| output::render_table(&rule_rows(d.rules.sorted())),
        |d| d.instance_id.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
