//! Client, Invite and File Operations

use serde_json::Value;

use crate::domain::{DomainResult, User};
use crate::services::{
    AcceptClientInviteInput, CreateFileInput, DeclineClientInviteInput, InviteToClientInput,
    Services,
};
use super::{input, output};

pub async fn my_profile(s: &Services, user: &User) -> DomainResult<Value> {
    output(s.my_profile(user).await?)
}

pub async fn invite_to_client(s: &Services, user: &User, vars: Value) -> DomainResult<Value> {
    let input: InviteToClientInput = input(vars)?;
    output(s.invite_to_client(user, input).await?)
}

pub async fn accept_client_invite(s: &Services, user: &User, vars: Value) -> DomainResult<Value> {
    let input: AcceptClientInviteInput = input(vars)?;
    output(s.accept_client_invite(user, input).await?)
}

pub async fn decline_client_invite(s: &Services, user: &User, vars: Value) -> DomainResult<Value> {
    let input: DeclineClientInviteInput = input(vars)?;
    output(s.decline_client_invite(user, input).await?)
}

pub async fn create_file(s: &Services, user: &User, vars: Value) -> DomainResult<Value> {
    let input: CreateFileInput = input(vars)?;
    output(s.create_file(user, input).await?)
}
