use std::time::Instant;

use axum::{
    extract::{Path, Query},
    routing::{get, post},
    Extension, Json, Router,
};
use lut_manager_client::{
    address::parse_table_address,
    analyzer::DuplicatePreview,
    network::{Cluster, NetworkConfig},
    notifications::{Notifications, Toast},
    view::{self, TablePage, ViewQuery, DEFAULT_PAGE_SIZE},
    workflow::{ExtendState, Transition},
    LookupTableSnapshot,
};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use solana_sdk::{pubkey::Pubkey, signature::Signature};

use crate::{
    error::ApiError,
    session::{ApiContext, Session},
};

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn router() -> Router {
    Router::new()
        .route("/network", get(get_network).post(set_network))
        .route("/wallet", get(get_wallet))
        .route("/lut/create", post(create_lut))
        .route("/lut/extend", get(get_extend).post(extend_lut))
        .route("/lut/extend/select", post(select_extend_table))
        .route("/lut/extend/proceed", post(proceed_extend))
        .route("/lut/extend/cancel", post(cancel_extend))
        .route("/lut/extend/retry", post(retry_extend))
        .route("/lut/:table", get(view_lut))
        .route("/notifications", get(list_notifications))
        .route("/notifications/:id/dismiss", post(dismiss_notification))
        .route("/notifications/:id/pause", post(pause_notification))
        .route("/notifications/:id/resume", post(resume_notification))
}

#[serde_as]
#[derive(Serialize)]
struct NetworkResponse {
    #[serde_as(as = "DisplayFromStr")]
    network: Cluster,
    label: &'static str,
    endpoint: String,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    available: Vec<Cluster>,
}

impl From<NetworkConfig> for NetworkResponse {
    fn from(network: NetworkConfig) -> Self {
        Self {
            network: network.cluster,
            label: network.cluster.label(),
            endpoint: network.endpoint(),
            available: Cluster::ALL.to_vec(),
        }
    }
}

#[serde_as]
#[derive(Deserialize)]
struct SetNetworkInput {
    #[serde_as(as = "DisplayFromStr")]
    cluster: Cluster,
}

async fn get_network(Extension(context): Extension<ApiContext>) -> Json<NetworkResponse> {
    Json(context.session().network.into())
}

async fn set_network(
    Extension(context): Extension<ApiContext>,
    Json(input): Json<SetNetworkInput>,
) -> Json<NetworkResponse> {
    Json(context.switch_network(input.cluster).into())
}

#[serde_as]
#[derive(Serialize)]
struct WalletResponse {
    connected: bool,
    #[serde_as(as = "Option<DisplayFromStr>")]
    public_key: Option<Pubkey>,
}

async fn get_wallet(Extension(context): Extension<ApiContext>) -> Json<WalletResponse> {
    let public_key = context.wallet.public_key();
    Json(WalletResponse {
        connected: public_key.is_some(),
        public_key,
    })
}

#[derive(Deserialize)]
struct AddressesInput {
    /// One address per line
    addresses: String,
}

#[serde_as]
#[derive(Serialize)]
struct CreateResponse {
    #[serde_as(as = "DisplayFromStr")]
    address: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    signature: Signature,
    explorer_url: String,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    addresses: Vec<Pubkey>,
}

async fn create_lut(
    Extension(context): Extension<ApiContext>,
    Json(input): Json<AddressesInput>,
) -> ApiResult<CreateResponse> {
    let session = context.session();
    match session.writer.create_lookup_table(&input.addresses).await {
        Ok(created) => {
            let explorer_url = session.network.explorer_url(&created.signature);
            context.notify(|toasts, now| {
                toasts.success(
                    now,
                    format!("LUT created successfully! Address: {}", created.address),
                    Some(explorer_url.clone()),
                )
            });
            Ok(Json(CreateResponse {
                address: created.address,
                signature: created.signature,
                explorer_url,
                addresses: created.addresses,
            }))
        }
        Err(err) => {
            context.notify(|toasts, now| {
                toasts.error(now, "Failed to create LUT", err.to_string())
            });
            Err(err.into())
        }
    }
}

#[serde_as]
#[derive(Serialize)]
struct SnapshotResponse {
    #[serde_as(as = "DisplayFromStr")]
    address: Pubkey,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    addresses: Vec<Pubkey>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    authority: Option<Pubkey>,
    active: bool,
    remaining_capacity: usize,
}

impl From<LookupTableSnapshot> for SnapshotResponse {
    fn from(snapshot: LookupTableSnapshot) -> Self {
        Self {
            active: snapshot.is_active(),
            remaining_capacity: snapshot.remaining_capacity(),
            address: snapshot.key,
            authority: snapshot.authority,
            addresses: snapshot.addresses,
        }
    }
}

#[derive(Serialize)]
struct ConfirmationResponse {
    unique_count: usize,
    duplicate_count: usize,
    duplicates: Vec<String>,
    more: Option<String>,
    can_proceed: bool,
}

impl ConfirmationResponse {
    fn new(preview: DuplicatePreview, can_proceed: bool) -> Self {
        Self {
            more: preview.more_label(),
            unique_count: preview.unique_count,
            duplicate_count: preview.duplicate_count,
            duplicates: preview.shown,
            can_proceed,
        }
    }
}

#[serde_as]
#[derive(Serialize)]
struct ReceiptResponse {
    #[serde_as(as = "DisplayFromStr")]
    signature: Signature,
    explorer_url: String,
    added: usize,
}

#[derive(Serialize)]
struct FailureResponse {
    kind: &'static str,
    message: String,
    table_input: String,
    input: String,
}

#[serde_as]
#[derive(Serialize)]
struct ExtendStateResponse {
    state: &'static str,
    #[serde_as(as = "Option<DisplayFromStr>")]
    table: Option<Pubkey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confirmation: Option<ConfirmationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    receipt: Option<ReceiptResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<FailureResponse>,
    /// The loaded target table
    current: Option<SnapshotResponse>,
}

impl ExtendStateResponse {
    fn new(
        state: &ExtendState,
        network: &NetworkConfig,
        current: Option<LookupTableSnapshot>,
    ) -> Self {
        let mut response = Self {
            state: state.name(),
            table: None,
            confirmation: None,
            receipt: None,
            failure: None,
            current: current.map(Into::into),
        };
        match state {
            ExtendState::Idle => {}
            ExtendState::Analyzing { table } | ExtendState::Submitting { table, .. } => {
                response.table = Some(*table);
            }
            ExtendState::NeedsConfirmation(pending) => {
                response.table = Some(pending.table);
                response.confirmation =
                    Some(ConfirmationResponse::new(pending.preview(), pending.can_proceed()));
            }
            ExtendState::Done(receipt) => {
                response.table = Some(receipt.table);
                response.receipt = Some(ReceiptResponse {
                    signature: receipt.signature,
                    explorer_url: network.explorer_url(&receipt.signature),
                    added: receipt.added.len(),
                });
            }
            ExtendState::Failed(failure) => {
                response.failure = Some(FailureResponse {
                    kind: failure.kind.as_str(),
                    message: failure.message.clone(),
                    table_input: failure.request.table_input.clone(),
                    input: failure.request.input.clone(),
                });
            }
        }
        response
    }
}

#[derive(Serialize)]
struct TransitionResponse {
    /// The action did not apply in the state the workflow was in
    ignored: bool,
    #[serde(flatten)]
    state: ExtendStateResponse,
}

/// Describe the workflow after `transition` and raise a toast for finished extensions.
///
/// `session` is the one the action ran on, even if the network was switched since.
fn transition_response(
    context: &ApiContext,
    session: &Session,
    transition: Transition,
) -> Json<TransitionResponse> {
    let current = session.extend.fetcher().current();
    let (ignored, state) = match transition {
        Transition::Ignored => (true, session.extend.state()),
        Transition::Settled(state) => {
            context.notify(|toasts, now| announce(toasts, now, &state, &session.network));
            (false, state)
        }
    };
    Json(TransitionResponse {
        ignored,
        state: ExtendStateResponse::new(&state, &session.network, current),
    })
}

fn announce(toasts: &mut Notifications, now: Instant, state: &ExtendState, network: &NetworkConfig) {
    match state {
        ExtendState::Done(receipt) => {
            toasts.success(
                now,
                format!(
                    "LUT extended successfully! {} addresses added.",
                    receipt.added.len()
                ),
                Some(network.explorer_url(&receipt.signature)),
            );
        }
        ExtendState::Failed(failure) => {
            toasts.error(now, "Failed to extend LUT", failure.message.clone());
        }
        _ => {}
    }
}

async fn get_extend(Extension(context): Extension<ApiContext>) -> Json<ExtendStateResponse> {
    let session = context.session();
    Json(ExtendStateResponse::new(
        &session.extend.state(),
        &session.network,
        session.extend.fetcher().current(),
    ))
}

#[derive(Deserialize)]
struct ExtendInput {
    table: String,
    addresses: String,
}

async fn extend_lut(
    Extension(context): Extension<ApiContext>,
    Json(input): Json<ExtendInput>,
) -> Json<TransitionResponse> {
    let session = context.session();
    let transition = session.extend.extend(&input.table, &input.addresses).await;
    transition_response(&context, &session, transition)
}

#[derive(Deserialize)]
struct SelectTableInput {
    table: String,
}

async fn select_extend_table(
    Extension(context): Extension<ApiContext>,
    Json(input): Json<SelectTableInput>,
) -> ApiResult<Option<SnapshotResponse>> {
    let workflow = context.session().extend;
    let outcome = workflow.load_table(&input.table).await?;
    Ok(Json(outcome.into_snapshot().map(Into::into)))
}

async fn proceed_extend(Extension(context): Extension<ApiContext>) -> Json<TransitionResponse> {
    let session = context.session();
    let transition = session.extend.proceed().await;
    transition_response(&context, &session, transition)
}

async fn cancel_extend(Extension(context): Extension<ApiContext>) -> Json<TransitionResponse> {
    let session = context.session();
    let transition = session.extend.cancel();
    transition_response(&context, &session, transition)
}

async fn retry_extend(Extension(context): Extension<ApiContext>) -> Json<TransitionResponse> {
    let session = context.session();
    let transition = session.extend.retry().await;
    transition_response(&context, &session, transition)
}

#[derive(Deserialize)]
struct ViewParams {
    page: Option<usize>,
    page_size: Option<usize>,
    search: Option<String>,
}

impl From<ViewParams> for ViewQuery {
    fn from(params: ViewParams) -> Self {
        Self {
            page: params.page.unwrap_or(0),
            page_size: params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            search: params.search,
        }
    }
}

#[derive(Serialize)]
struct RowResponse {
    index: usize,
    address: String,
}

#[serde_as]
#[derive(Serialize)]
struct ViewResponse {
    status: &'static str,
    #[serde_as(as = "DisplayFromStr")]
    address: Pubkey,
    #[serde_as(as = "Option<DisplayFromStr>")]
    authority: Option<Pubkey>,
    active: bool,
    total: usize,
    matched: usize,
    page: usize,
    page_count: usize,
    rows: Vec<RowResponse>,
}

impl ViewResponse {
    fn new(snapshot: &LookupTableSnapshot, page: TablePage) -> Self {
        Self {
            status: "loaded",
            address: snapshot.key,
            authority: snapshot.authority,
            active: snapshot.is_active(),
            total: page.total,
            matched: page.matched,
            page: page.page,
            page_count: page.page_count,
            rows: page
                .rows
                .into_iter()
                .map(|row| RowResponse {
                    index: row.index,
                    address: row.copy_text(),
                })
                .collect(),
        }
    }
}

async fn view_lut(
    Extension(context): Extension<ApiContext>,
    Path(table): Path<String>,
    Query(params): Query<ViewParams>,
) -> ApiResult<ViewResponse> {
    let table = parse_table_address(&table)?;
    let snapshot = context.session().viewer.load(&table).await?;
    let page = view::page(&snapshot, &params.into());
    Ok(Json(ViewResponse::new(&snapshot, page)))
}

#[derive(Serialize)]
struct ToastResponse {
    id: u64,
    variant: &'static str,
    title: String,
    description: Option<String>,
    link: Option<String>,
    remaining_ms: u64,
    progress: f32,
    paused: bool,
}

impl ToastResponse {
    fn new(toast: &Toast, now: Instant) -> Self {
        Self {
            id: toast.id,
            variant: toast.variant.as_str(),
            title: toast.title.clone(),
            description: toast.description.clone(),
            link: toast.link.clone(),
            remaining_ms: toast.remaining(now).as_millis() as u64,
            progress: toast.progress(now),
            paused: toast.is_paused(),
        }
    }
}

async fn list_notifications(Extension(context): Extension<ApiContext>) -> Json<Vec<ToastResponse>> {
    let toasts = context.notify(|toasts, now| {
        toasts.expire(now);
        toasts
            .active(now)
            .map(|toast| ToastResponse::new(toast, now))
            .collect()
    });
    Json(toasts)
}

#[derive(Serialize)]
struct UpdatedResponse {
    updated: bool,
}

async fn dismiss_notification(
    Extension(context): Extension<ApiContext>,
    Path(id): Path<u64>,
) -> Json<UpdatedResponse> {
    let updated = context.notify(|toasts, _| toasts.dismiss(id).is_some());
    Json(UpdatedResponse { updated })
}

async fn pause_notification(
    Extension(context): Extension<ApiContext>,
    Path(id): Path<u64>,
) -> Json<UpdatedResponse> {
    let updated = context.notify(|toasts, now| toasts.pause(id, now));
    Json(UpdatedResponse { updated })
}

async fn resume_notification(
    Extension(context): Extension<ApiContext>,
    Path(id): Path<u64>,
) -> Json<UpdatedResponse> {
    let updated = context.notify(|toasts, now| toasts.resume(id, now));
    Json(UpdatedResponse { updated })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lut_manager_client::{
        wallet::KeypairWallet,
        workflow::{ExtendOptions, ExtendReceipt},
    };

    use super::*;

    #[tokio::test]
    async fn finished_extension_links_to_the_network_it_ran_on() {
        let context = ApiContext::new(
            NetworkConfig::default(),
            Arc::new(KeypairWallet::disconnected()),
            ExtendOptions::default(),
        );
        let session = context.session();
        // switched while the extension was in flight
        context.switch_network(Cluster::MainnetBeta);

        let signature = Signature::default();
        let receipt = ExtendReceipt {
            table: Pubkey::new_unique(),
            signature,
            added: vec![Pubkey::new_unique()],
            snapshot: None,
        };
        let Json(response) = transition_response(
            &context,
            &session,
            Transition::Settled(ExtendState::Done(receipt)),
        );

        let expected = format!("https://solscan.io/tx/{signature}?cluster=devnet");
        assert!(!response.ignored);
        assert_eq!(response.state.receipt.unwrap().explorer_url, expected);
        let link = context.notify(|toasts, now| {
            toasts.active(now).next().and_then(|toast| toast.link.clone())
        });
        assert_eq!(link, Some(expected));
    }
}
