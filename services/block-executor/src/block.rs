//! Block coordinator
//!
//! Entry points for the host state machine. Block start clears the staging
//! state, rolls epochs, and prunes stale prices; block end runs the
//! failure-exclusion fixed point: every surviving contract executes against
//! a branched store, and either the whole iteration commits or the failing
//! contracts are excluded and the iteration retries from the snapshots.
//!
//! Both entry points swallow panics at the outermost frame so a module bug
//! cannot halt consensus; the panic is logged and counted instead.
// TODO: propagate panics once downstream consumers can survive a halted
// module instead of silently doing nothing for the block.

use crate::context::BlockContext;
use crate::execution;
use crate::hooks::{ContractHooks, SudoFinalizeBlockMsg};
use crate::keeper;
use crate::runner::{panic_message, ParallelRunner};
use crate::store::{MemStore, StoreBranch};
use crate::telemetry::ExecutionMetrics;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{error, info, warn};
use types::contract::ContractInfo;
use types::errors::ExecutionError;
use types::ids::ContractAddr;
use types::settlement::{MatchResult, SettlementEntry};

/// Block-start housekeeping
///
/// Clears the in-memory block state, rolls the epoch over when due, invokes
/// the new-block hook for subscribed contracts, and prunes price snapshots
/// past retention.
pub fn begin_block<H: ContractHooks>(
    ctx: &mut BlockContext,
    store: &mut MemStore,
    hooks: &H,
    metrics: &ExecutionMetrics,
) {
    let result = catch_unwind(AssertUnwindSafe(|| begin_block_inner(ctx, store, hooks)));
    match result {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            error!(height = ctx.height, %err, "block-start failed");
            metrics.record_begin_block_panic(&err.to_string());
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(height = ctx.height, %message, "panic occurred in block start");
            metrics.record_begin_block_panic(&message);
        }
    }
}

fn begin_block_inner<H: ContractHooks>(
    ctx: &mut BlockContext,
    store: &mut MemStore,
    hooks: &H,
) -> Result<(), ExecutionError> {
    ctx.state.clear();

    let params = keeper::params(store)?;
    let (is_new, current_epoch) = keeper::is_new_epoch(store, &params, ctx.timestamp)?;
    if is_new {
        keeper::set_epoch(store, current_epoch)?;
    }

    let cutoff = ctx.timestamp.saturating_sub(params.price_snapshot_retention);
    for contract in keeper::all_contracts(store)? {
        let addr = &contract.contract_addr;
        if contract.need_hook {
            if let Err(err) = hooks.handle_new_block(addr, current_epoch) {
                error!(contract = %addr, %err, "new-block hook error");
            }
        }
        if contract.need_order_matching {
            for pair in keeper::all_registered_pairs(store, addr)? {
                keeper::delete_price_states_before(store, addr, &pair.key(), cutoff)?;
            }
        }
    }
    Ok(())
}

/// Block-end matching with atomic per-contract commit
///
/// See the module docs for the iteration structure. Committed state is
/// independent of worker count and scheduling: inputs are sorted before
/// dispatch and all aggregation is keyed.
pub fn end_block<H: ContractHooks>(
    ctx: &mut BlockContext,
    store: &mut MemStore,
    hooks: &H,
    runner: &ParallelRunner,
    metrics: &ExecutionMetrics,
) {
    let result = catch_unwind(AssertUnwindSafe(|| {
        end_block_inner(ctx, store, hooks, runner, metrics)
    }));
    match result {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            error!(height = ctx.height, %err, "block-end failed; committing nothing");
            metrics.record_end_block_panic(&err.to_string(), None);
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(height = ctx.height, %message, "panic occurred in block end");
            metrics.record_end_block_panic(&message, None);
        }
    }
}

fn end_block_inner<H: ContractHooks>(
    ctx: &mut BlockContext,
    store: &mut MemStore,
    hooks: &H,
    runner: &ParallelRunner,
    metrics: &ExecutionMetrics,
) -> Result<(), ExecutionError> {
    let mut remaining: BTreeMap<ContractAddr, ContractInfo> = keeper::all_contracts(store)?
        .into_iter()
        .map(|info| (info.contract_addr.clone(), info))
        .collect();

    // Each iteration is atomic: it either commits for every surviving
    // contract or rolls back entirely, drops the failing contracts, and
    // retries. `remaining` strictly shrinks, bounding the loop.
    let mut iterations_left = remaining.len();
    while !remaining.is_empty() {
        let mem_snapshot = ctx.state.deep_copy();
        let mut branch = StoreBranch::new(store);
        let mut failed: BTreeSet<ContractAddr> = BTreeSet::new();

        // Deposits mutate shared bank state; keep them sequential.
        for addr in remaining.keys() {
            if let Err(err) = hooks.handle_deposits(addr, &mut branch) {
                warn!(contract = %addr, %err, "deposit handling failed");
                failed.insert(addr.clone());
            }
        }

        // Parallel matching over the frozen iteration view.
        let infos: Vec<ContractInfo> = remaining.values().cloned().collect();
        let deposit_failed = failed.clone();
        let frozen = &branch;
        let matching_results = runner.run(infos.clone(), |info| {
            if !info.need_order_matching || deposit_failed.contains(&info.contract_addr) {
                return Ok(None);
            }
            execution::handle_execution_for_contract(
                frozen,
                &ctx.state,
                ctx.timestamp,
                hooks,
                &info,
                runner,
                metrics,
            )
            .map(Some)
        });

        // Record outputs in contract order; `infos` is address-sorted.
        let mut finalize_msgs: BTreeMap<ContractAddr, SudoFinalizeBlockMsg> = remaining
            .keys()
            .map(|addr| (addr.clone(), SudoFinalizeBlockMsg::new()))
            .collect();
        let mut settlements_by_contract: BTreeMap<ContractAddr, Vec<SettlementEntry>> =
            BTreeMap::new();
        let mut pending_events = Vec::new();

        for (info, task_result) in infos.iter().zip(matching_results) {
            let addr = &info.contract_addr;
            match task_result {
                Ok(Ok(None)) => {}
                Ok(Ok(Some(output))) => {
                    branch.apply_delta(output.delta);
                    keeper::set_match_result(
                        &mut branch,
                        addr,
                        &MatchResult::new(
                            addr,
                            output.orders,
                            output.cancellations,
                            output.settlements.clone(),
                        ),
                    )?;
                    for (account, result) in output.order_results {
                        let account_addr = ContractAddr::new(account);
                        if let Some(msg) = finalize_msgs.get_mut(&account_addr) {
                            msg.add_contract_result(result);
                        }
                    }
                    settlements_by_contract.insert(addr.clone(), output.settlements);
                    pending_events.push(output.events);
                }
                Ok(Err(err)) => {
                    warn!(contract = %addr, %err, "contract execution failed");
                    failed.insert(addr.clone());
                }
                Err(panic) => {
                    error!(
                        contract = %addr,
                        message = %panic.message,
                        "panic occurred during order matching"
                    );
                    metrics.record_end_block_panic(&panic.message, Some(addr.as_str()));
                    failed.insert(addr.clone());
                }
            }
        }

        // Serial post-matching hooks for the survivors.
        for (addr, info) in remaining.iter() {
            if failed.contains(addr) {
                continue;
            }
            if info.need_order_matching {
                let empty = Vec::new();
                let settlements = settlements_by_contract.get(addr).unwrap_or(&empty);
                if let Err(err) = hooks.handle_settlements(addr, settlements, &mut branch) {
                    warn!(contract = %addr, %err, "settlement handling failed");
                    failed.insert(addr.clone());
                    continue;
                }
            }
            if info.need_hook {
                let msg = finalize_msgs.get(addr).cloned().unwrap_or_default();
                if let Err(err) = hooks.finalize_block(addr, &msg) {
                    warn!(contract = %addr, %err, "finalize-block hook failed");
                    failed.insert(addr.clone());
                }
            }
        }

        if failed.is_empty() {
            let delta = branch.into_delta();
            store.apply_delta(delta);
            for events in pending_events {
                ctx.emit_events(events);
            }
            info!(
                height = ctx.height,
                contracts = remaining.len(),
                "block matching committed"
            );
            return Ok(());
        }

        // Roll back and exclude the failures; BTreeSet iteration keeps the
        // exclusion order replica-independent.
        drop(branch);
        ctx.state.restore(mem_snapshot);
        for addr in &failed {
            ctx.state.deep_filter_account(addr);
            remaining.remove(addr);
            warn!(contract = %addr, "contract excluded for this block");
        }

        iterations_left -= 1;
        if iterations_left == 0 {
            error!("all contracts failed in block end; committing nothing");
            return Ok(());
        }
    }
    Ok(())
}
