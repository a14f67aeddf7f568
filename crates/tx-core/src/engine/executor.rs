//! Executor de flujos.
//!
//! Un run es una única tarea cooperativa: los pasos se ejecutan estrictamente
//! en orden y cada transición de estado se agrega al log de eventos antes de
//! que ocurra la siguiente. Ante el primer error el run se detiene; no hay
//! compensación.

use std::sync::Arc;

use log::{debug, error, info};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::confirm::ConfirmationWaiter;
use crate::constants::ENGINE_VERSION;
use crate::engine::FlowCtx;
use crate::errors::{FlowError, FlowFailure};
use crate::event::{EventStore, FlowEvent, FlowEventKind};
use crate::flow::{FlowDefinition, FlowRun, FlowSnapshot};
use crate::hashing::hash_value;
use crate::model::{AccountContext, FlowRequest};
use crate::step::{StepId, StepStatus, TxStep};

pub struct FlowExecutor<E: EventStore> {
    events: Arc<E>,
}

impl<E: EventStore> FlowExecutor<E> {
    pub fn new(events: Arc<E>) -> Self {
        Self { events }
    }

    pub fn event_store(&self) -> &Arc<E> {
        &self.events
    }

    /// Vista previa del plan, sin enviar nada.
    pub async fn plan(&self, definition: &dyn FlowDefinition, request: &FlowRequest, account: &AccountContext)
                      -> Result<Vec<StepId>, FlowError> {
        check_flow(definition, request)?;
        let cancel = CancellationToken::new();
        let ctx = FlowCtx::new(account, request, Uuid::nil(), self.events.as_ref(), &cancel);
        plan_steps(definition, &ctx).await
    }

    /// Plan con nombres legibles de cada paso.
    pub async fn describe(&self, definition: &dyn FlowDefinition, request: &FlowRequest, account: &AccountContext)
                          -> Result<Vec<(StepId, String)>, FlowError> {
        check_flow(definition, request)?;
        let cancel = CancellationToken::new();
        let ctx = FlowCtx::new(account, request, Uuid::nil(), self.events.as_ref(), &cancel);
        let plan = plan_steps(definition, &ctx).await?;
        let steps = resolve(definition, &plan)?;
        Ok(plan.into_iter()
               .zip(steps)
               .enumerate()
               .map(|(i, (id, step))| {
                   let name = step.display_name(&ctx.for_step(i, id.clone()));
                   (id, name)
               })
               .collect())
    }

    /// Ejecuta un run completo. Devuelve el run terminado o un `FlowFailure`
    /// con el run, el paso que falló y el error original.
    pub async fn run(&self, definition: &dyn FlowDefinition, request: FlowRequest, account: &AccountContext,
                     cancel: CancellationToken)
                     -> Result<FlowRun, FlowFailure> {
        let flow_id = Uuid::new_v4();
        let request = Arc::new(request);
        let mut run = FlowRun::new(flow_id, request.clone());
        info!("flow start flow_id={} flow={} relayed={}", flow_id, definition.flow_id(), account.relayed);

        if let Err(e) = check_flow(definition, &request) {
            return Err(self.abort(run, None, e));
        }
        let ctx = FlowCtx::new(account, &request, flow_id, self.events.as_ref(), &cancel);

        let plan = match plan_steps(definition, &ctx).await {
            Ok(plan) => plan,
            Err(e) => return Err(self.abort(run, None, e)),
        };
        // todos los ids se resuelven antes de tocar la cadena
        let steps = match resolve(definition, &plan).and_then(|steps| run.set_plan(plan.clone()).map(|_| steps)) {
            Ok(steps) => steps,
            Err(e) => return Err(self.abort(run, None, e)),
        };

        let plan_hash = hash_value(&json!({ "engine": ENGINE_VERSION,
                                            "flow": definition.flow_id(),
                                            "steps": plan,
                                            "request": request.to_json() }));
        debug!("flow planned flow_id={} steps={:?} plan_hash={}", flow_id, plan, plan_hash);
        self.events.append_kind(flow_id,
                                FlowEventKind::FlowPlanned { flow: definition.flow_id().to_string(),
                                                             steps: plan.clone(),
                                                             plan_hash: plan_hash.clone(),
                                                             relayed: account.relayed });

        let waiter = ConfirmationWaiter::new(account.ports.receipts.clone(), &account.config)
            .with_relay(account.ports.relay.clone())
            .with_cancel(cancel.clone());

        for (index, (id, step)) in plan.iter().zip(steps.iter()).enumerate() {
            let step_ctx = ctx.for_step(index, id.clone());
            if let Err(e) = self.drive_step(&step_ctx, index, id, step.as_ref(), &waiter, &mut run).await {
                error!("step failed flow_id={} step={} err={}", flow_id, id, e);
                // un fallo de transición no puede volver a fallar el paso; el error original se conserva
                let _ = run.transition(id, StepStatus::Failed(e.clone()));
                self.events.append_kind(flow_id,
                                        FlowEventKind::StepFailed { step_index: index,
                                                                    step_id: id.clone(),
                                                                    error: e.to_string() });
                return Err(self.abort(run, Some(id.clone()), e));
            }
            run.current_index = index + 1;
        }

        self.events.append_kind(flow_id, FlowEventKind::FlowCompleted { plan_hash });
        info!("flow completed flow_id={} steps={}", flow_id, run.planned_steps.len());
        Ok(run)
    }

    async fn drive_step(&self, ctx: &FlowCtx<'_>, index: usize, id: &StepId, step: &dyn TxStep,
                        waiter: &ConfirmationWaiter, run: &mut FlowRun)
                        -> Result<(), FlowError> {
        run.transition(id, StepStatus::AwaitingSignature)?;
        self.events.append_kind(ctx.flow_id,
                                FlowEventKind::StepAwaitingSignature { step_index: index,
                                                                       step_id: id.clone() });

        let tx = step.submit(ctx).await?;
        run.transition(id, StepStatus::Submitted(tx))?;
        self.events.append_kind(ctx.flow_id,
                                FlowEventKind::StepSubmitted { step_index: index,
                                                               step_id: id.clone(),
                                                               tx });
        debug!("step submitted flow_id={} step={} hash={} path={:?}", ctx.flow_id, id, tx.hash, tx.path);

        let receipt = waiter.wait(tx).await?;
        step.verify(ctx, &receipt).await?;

        run.transition(id, StepStatus::Confirmed(receipt))?;
        self.events.append_kind(ctx.flow_id,
                                FlowEventKind::StepConfirmed { step_index: index,
                                                               step_id: id.clone(),
                                                               receipt });
        debug!("step confirmed flow_id={} step={} block={}", ctx.flow_id, id, receipt.block_number);
        Ok(())
    }

    fn abort(&self, run: FlowRun, failed_step: Option<StepId>, error: FlowError) -> FlowFailure {
        if failed_step.is_none() {
            error!("flow aborted before execution flow_id={} err={}", run.id, error);
        }
        self.events.append_kind(run.id, FlowEventKind::FlowFailed { error: error.to_string() });
        FlowFailure { flow_id: run.id,
                      failed_step,
                      error,
                      run: Box::new(run) }
    }

    pub fn events(&self, flow_id: Uuid) -> Vec<FlowEvent> {
        self.events.list(flow_id)
    }

    pub fn snapshot(&self, flow_id: Uuid) -> Option<FlowSnapshot> {
        FlowSnapshot::from_events(&self.events.list(flow_id))
    }

    /// Descarta el log de un run terminado y devuelve sus eventos. Un run en
    /// curso (o desconocido) conserva su log y devuelve `None`.
    pub fn discard(&self, flow_id: Uuid) -> Option<Vec<FlowEvent>> {
        let terminal = self.events.list(flow_id).last().is_some_and(|e| e.kind.is_terminal());
        if !terminal {
            return None;
        }
        debug!("discard terminal run flow_id={}", flow_id);
        Some(self.events.discard(flow_id))
    }
}

fn check_flow(definition: &dyn FlowDefinition, request: &FlowRequest) -> Result<(), FlowError> {
    if definition.flow_id() != request.flow() {
        return Err(FlowError::FlowMismatch { expected: definition.flow_id().to_string(),
                                             got: request.flow().to_string() });
    }
    Ok(())
}

async fn plan_steps(definition: &dyn FlowDefinition, ctx: &FlowCtx<'_>) -> Result<Vec<StepId>, FlowError> {
    let plan = definition.plan(ctx).await?;
    if plan.is_empty() {
        return Err(FlowError::NothingToDo);
    }
    Ok(plan)
}

fn resolve(definition: &dyn FlowDefinition, plan: &[StepId]) -> Result<Vec<Box<dyn TxStep>>, FlowError> {
    plan.iter()
        .map(|id| definition.step(id).ok_or_else(|| FlowError::UnknownStep(id.to_string())))
        .collect()
}
