//! Geyser protocol messages.
//!
//! Builds outbound `SubscribeRequest`s from a [`SubscriptionFilter`] and
//! converts inbound `SubscribeUpdate`s into [`TransactionEvent`]s. Nothing
//! outside this module touches protobuf types.

use chrono::{DateTime, Utc};
use pumpwatch_core::{
    Address, Commitment, CompiledInstruction, SubscriptionFilter, TokenBalance, TransactionEvent,
    TransactionMeta,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use yellowstone_grpc_proto::geyser::SubscribeRequestFilterTransactions;
use yellowstone_grpc_proto::prelude::{
    subscribe_update::UpdateOneof, CommitmentLevel, SubscribeRequest, SubscribeRequestPing,
    SubscribeUpdate, SubscribeUpdateTransaction, TokenBalance as ProtoTokenBalance,
    TransactionStatusMeta,
};

/// Ping id used for client heartbeats and replies to server pings.
pub const HEARTBEAT_PING_ID: i32 = 1;

/// Inbound update, reduced to what the connection manager acts on.
#[derive(Debug)]
pub enum Inbound {
    Transaction(Box<TransactionEvent>),
    /// Server keepalive, must be answered.
    Ping,
    /// Reply to one of our pings.
    Pong(i32),
    /// Update kinds this client never subscribes to.
    Ignored,
    Malformed(&'static str),
}

fn commitment_level(commitment: Commitment) -> CommitmentLevel {
    match commitment {
        Commitment::Processed => CommitmentLevel::Processed,
        Commitment::Confirmed => CommitmentLevel::Confirmed,
        Commitment::Finalized => CommitmentLevel::Finalized,
    }
}

/// Full subscribe request for a filter. The address list is sent whole.
pub fn subscribe_request(filter: &SubscriptionFilter) -> SubscribeRequest {
    let mut transactions = HashMap::new();
    transactions.insert(
        filter.tag.clone(),
        SubscribeRequestFilterTransactions {
            vote: Some(false),
            // None delivers both successful and failed transactions
            failed: filter.exclude_failed.then_some(false),
            signature: None,
            account_include: filter
                .included_addresses
                .iter()
                .map(|a| a.to_string())
                .collect(),
            account_exclude: vec![],
            account_required: vec![filter.required_program.to_string()],
        },
    );

    SubscribeRequest {
        accounts: HashMap::default(),
        slots: HashMap::default(),
        transactions,
        transactions_status: HashMap::default(),
        blocks: HashMap::default(),
        blocks_meta: HashMap::default(),
        entry: HashMap::default(),
        commitment: Some(commitment_level(filter.commitment) as i32),
        accounts_data_slice: Vec::default(),
        ping: None,
        ..Default::default()
    }
}

/// Keepalive frame: no filters, only a ping.
pub fn ping_request() -> SubscribeRequest {
    SubscribeRequest {
        ping: Some(SubscribeRequestPing {
            id: HEARTBEAT_PING_ID,
        }),
        ..Default::default()
    }
}

/// Whether a request is a keepalive frame rather than a subscription.
pub fn is_ping_request(request: &SubscribeRequest) -> bool {
    request.ping.is_some() && request.transactions.is_empty()
}

/// Classify an inbound update.
pub fn decode_update(update: SubscribeUpdate, received_at: DateTime<Utc>) -> Inbound {
    match update.update_oneof {
        Some(UpdateOneof::Transaction(tx)) => {
            match transaction_event(update.filters, tx, received_at) {
                Ok(event) => Inbound::Transaction(Box::new(event)),
                Err(reason) => Inbound::Malformed(reason),
            }
        }
        Some(UpdateOneof::Ping(_)) => Inbound::Ping,
        Some(UpdateOneof::Pong(pong)) => Inbound::Pong(pong.id),
        Some(_) => Inbound::Ignored,
        None => Inbound::Malformed("update_oneof missing"),
    }
}

fn transaction_event(
    filters: Vec<String>,
    update: SubscribeUpdateTransaction,
    received_at: DateTime<Utc>,
) -> Result<TransactionEvent, &'static str> {
    let info = update.transaction.ok_or("transaction info missing")?;
    let message = info
        .transaction
        .as_ref()
        .and_then(|tx| tx.message.as_ref())
        .ok_or("transaction message missing")?;

    // Static keys, then v0 lookup-table keys (writable before readonly).
    let mut account_keys: Vec<Address> = message
        .account_keys
        .iter()
        .map(|k| Address::from_bytes(k))
        .collect();
    if let Some(meta) = &info.meta {
        account_keys.extend(meta.loaded_writable_addresses.iter().map(|k| Address::from_bytes(k)));
        account_keys.extend(meta.loaded_readonly_addresses.iter().map(|k| Address::from_bytes(k)));
    }

    let mut instructions: Vec<CompiledInstruction> = message
        .instructions
        .iter()
        .map(|ix| CompiledInstruction {
            program_id_index: ix.program_id_index,
            data: ix.data.clone(),
        })
        .collect();
    if let Some(meta) = &info.meta {
        for group in &meta.inner_instructions {
            instructions.extend(group.instructions.iter().map(|ix| CompiledInstruction {
                program_id_index: ix.program_id_index,
                data: ix.data.clone(),
            }));
        }
    }

    Ok(TransactionEvent {
        signature: bs58::encode(&info.signature).into_string(),
        slot: update.slot,
        filters,
        account_keys,
        instructions,
        meta: info.meta.map(transaction_meta),
        received_at,
    })
}

fn transaction_meta(meta: TransactionStatusMeta) -> TransactionMeta {
    TransactionMeta {
        log_messages: meta.log_messages,
        pre_balances: meta.pre_balances,
        post_balances: meta.post_balances,
        pre_token_balances: Some(meta.pre_token_balances.iter().map(token_balance).collect()),
        post_token_balances: Some(meta.post_token_balances.iter().map(token_balance).collect()),
    }
}

fn token_balance(balance: &ProtoTokenBalance) -> TokenBalance {
    let ui_amount = balance.ui_token_amount.as_ref().and_then(|ui| {
        Decimal::from_str(&ui.ui_amount_string)
            .ok()
            .or_else(|| Decimal::try_from(ui.ui_amount).ok())
    });
    TokenBalance {
        account_index: balance.account_index,
        mint: balance.mint.clone(),
        owner: balance.owner.clone(),
        ui_amount,
    }
}
