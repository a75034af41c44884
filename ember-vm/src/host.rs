use std::sync::Arc;

use ember_storage::auth_store::AuthStore;
use ember_storage::gas_store::GasLedger;
use ember_storage::token_store::TokenStore;
use ember_storage::traits::KvStore;
use ember_types::primitives::{Algorithm, ContractId, Timestamp};
use tracing::{debug, warn};

use crate::abi::{ContractRegistry, Value};
use crate::call_stack::{CallFrame, CallStack};
use crate::context::ExecutionContext;
use crate::cost::{Cost, CONTRACT_NAME_COST, REQUIRE_AUTH_COST};
use crate::error::VmError;

/// Shared store handle seen by contracts.
pub type SharedStore = Arc<dyn KvStore>;

/// Everything a native contract can reach while it runs: state, the
/// transaction's context and verified signers, and nested calls.
pub struct Host {
    store: SharedStore,
    registry: Arc<ContractRegistry>,
    ctx: ExecutionContext,
    /// Public keys whose signatures over the transaction were verified.
    signers: Vec<(Algorithm, Vec<u8>)>,
    call_stack: CallStack,
}

impl Host {
    pub fn new(
        store: SharedStore,
        registry: Arc<ContractRegistry>,
        ctx: ExecutionContext,
        signers: Vec<(Algorithm, Vec<u8>)>,
    ) -> Self {
        Self {
            store,
            registry,
            ctx,
            signers,
            call_stack: CallStack::new(),
        }
    }

    /// Block time in nanoseconds.
    pub fn current_time(&self) -> Timestamp {
        self.ctx.time
    }

    /// Identity of the contract currently executing.
    pub fn contract_name(&self) -> (ContractId, Cost) {
        let name = self
            .call_stack
            .current_contract()
            .unwrap_or_default()
            .to_string();
        (name, CONTRACT_NAME_COST)
    }

    /// Whether `id` names a registered contract rather than a user account.
    pub fn is_contract(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    pub fn call_depth(&self) -> usize {
        self.call_stack.depth()
    }

    pub fn gas_ledger(&self) -> GasLedger<SharedStore> {
        GasLedger::new(Arc::clone(&self.store))
    }

    pub fn token_store(&self) -> TokenStore<SharedStore> {
        TokenStore::new(Arc::clone(&self.store))
    }

    /// Whether the running transaction holds `permission` for `account`.
    ///
    /// Satisfied either by the verified signers against the account's stored
    /// permissions, or when `account` is the contract that delegated its
    /// authority to the current frame through [`call_with_auth`](Self::call_with_auth).
    pub fn require_auth(&self, account: &str, permission: &str) -> (bool, Cost) {
        if self.call_stack.delegated_authority() == Some(account) {
            return (true, REQUIRE_AUTH_COST);
        }
        let authorized = match AuthStore::new(Arc::clone(&self.store)).load(account) {
            Ok(Some(auth)) => auth.authorizes(permission, &self.signers),
            Ok(None) => false,
            Err(e) => {
                warn!(account, permission, error = %e, "failed to load account permissions");
                false
            }
        };
        debug!(account, permission, authorized, "require_auth");
        (authorized, REQUIRE_AUTH_COST)
    }

    /// Run `function` of `contract` synchronously with JSON positional args.
    /// The returned cost covers the call itself and everything the callee
    /// consumed, also when it fails.
    pub fn call(
        &mut self,
        contract: &str,
        function: &str,
        json_args: &str,
    ) -> (Result<Vec<Value>, VmError>, Cost) {
        self.dispatch(CallFrame::new(contract, function), json_args)
    }

    /// Like [`call`](Self::call), but the callee may act with the calling
    /// contract's own authority.
    pub fn call_with_auth(
        &mut self,
        contract: &str,
        function: &str,
        json_args: &str,
    ) -> (Result<Vec<Value>, VmError>, Cost) {
        let granter = self.call_stack.current_contract().map(str::to_string);
        self.dispatch(
            CallFrame::new(contract, function).with_auth_from(granter),
            json_args,
        )
    }

    fn dispatch(
        &mut self,
        frame: CallFrame,
        json_args: &str,
    ) -> (Result<Vec<Value>, VmError>, Cost) {
        let mut cost = Cost::call(json_args.len());
        let registry = Arc::clone(&self.registry);
        let abi = match registry.abi(&frame.contract, &frame.function) {
            Ok(abi) => abi,
            Err(e) => return (Err(e), cost),
        };
        debug!(
            tx = %self.ctx.short_hash(),
            publisher = %self.ctx.publisher,
            contract = %frame.contract,
            function = %frame.function,
            depth = self.call_stack.depth() + 1,
            "call"
        );
        if let Err(e) = self.call_stack.push(frame) {
            return (Err(e), cost);
        }
        let result = abi.invoke(self, &mut cost, json_args);
        self.call_stack.pop();
        (result, cost)
    }
}

#[cfg(test)]
mod tests {
    use ember_storage::memory::MemoryStore;
    use ember_types::auth::AccountAuth;

    use super::*;
    use crate::abi::{Abi, AbiSet};
    use crate::cost::{common_error_cost, CALL_CPU};

    fn host_with(registry: ContractRegistry, signers: Vec<(Algorithm, Vec<u8>)>) -> Host {
        let store: SharedStore = Arc::new(MemoryStore::new());
        AuthStore::new(Arc::clone(&store))
            .save("alice", &AccountAuth::single_key(Algorithm::Ed25519, vec![1; 32]))
            .unwrap();
        Host::new(
            store,
            Arc::new(registry),
            ExecutionContext::new(5_000, "alice", [7; 32]),
            signers,
        )
    }

    fn whoami(host: &mut Host, cost: &mut Cost, _: ()) -> Result<Vec<Value>, VmError> {
        let (name, c) = host.contract_name();
        *cost += c;
        Ok(vec![Value::String(name), Value::Number(host.call_depth() as i64)])
    }

    fn fails(_: &mut Host, cost: &mut Cost, _: ()) -> Result<Vec<Value>, VmError> {
        *cost += common_error_cost(3);
        Err(VmError::InvalidTransaction {
            reason: "always".into(),
        })
    }

    fn relay(host: &mut Host, cost: &mut Cost, _: ()) -> Result<Vec<Value>, VmError> {
        let (result, c) = host.call_with_auth("b.ember", "check", "[]");
        *cost += c;
        result
    }

    fn check(host: &mut Host, cost: &mut Cost, _: ()) -> Result<Vec<Value>, VmError> {
        let (ok, c) = host.require_auth("a.ember", "active");
        *cost += c;
        Ok(vec![Value::Bool(ok)])
    }

    fn looping(host: &mut Host, cost: &mut Cost, _: ()) -> Result<Vec<Value>, VmError> {
        let (result, c) = host.call("a.ember", "loop", "[]");
        *cost += c;
        result
    }

    fn test_registry() -> ContractRegistry {
        let mut registry = ContractRegistry::new();
        registry.register(
            "a.ember",
            AbiSet::new()
                .with(Abi::new("whoami", whoami))
                .with(Abi::new("fails", fails))
                .with(Abi::new("relay", relay))
                .with(Abi::new("loop", looping)),
        );
        registry.register("b.ember", AbiSet::new().with(Abi::new("check", check)));
        registry
    }

    #[test]
    fn test_current_time_and_contract_name() {
        let mut host = host_with(test_registry(), vec![]);
        assert_eq!(host.current_time(), 5_000);
        assert_eq!(host.contract_name().0, "");

        let (result, cost) = host.call("a.ember", "whoami", "[]");
        assert_eq!(
            result.unwrap(),
            vec![Value::String("a.ember".into()), Value::Number(1)]
        );
        assert_eq!(cost, Cost::call(2) + CONTRACT_NAME_COST);
        assert_eq!(host.call_depth(), 0);
    }

    #[test]
    fn test_failed_call_still_reports_cost() {
        let mut host = host_with(test_registry(), vec![]);
        let (result, cost) = host.call("a.ember", "fails", "[]");
        assert!(result.is_err());
        assert_eq!(cost.cpu, CALL_CPU + 30);
    }

    #[test]
    fn test_unknown_targets() {
        let mut host = host_with(test_registry(), vec![]);
        assert!(matches!(
            host.call("a.ember", "missing", "[]").0,
            Err(VmError::AbiNotFound { .. })
        ));
        assert!(matches!(
            host.call("zzz.ember", "whoami", "[]").0,
            Err(VmError::ContractNotFound { .. })
        ));
        assert!(matches!(
            host.call("a.ember", "whoami", r#"["unexpected"]"#).0,
            Err(VmError::InvalidArgumentEncoding { .. })
        ));
    }

    #[test]
    fn test_require_auth_by_signer() {
        let host = host_with(test_registry(), vec![(Algorithm::Ed25519, vec![1; 32])]);
        assert!(host.require_auth("alice", "transfer").0);
        assert!(!host.require_auth("bobby", "transfer").0);

        let host = host_with(test_registry(), vec![(Algorithm::Ed25519, vec![2; 32])]);
        let (ok, cost) = host.require_auth("alice", "transfer");
        assert!(!ok);
        assert_eq!(cost, REQUIRE_AUTH_COST);
    }

    #[test]
    fn test_call_with_auth_delegates_contract_authority() {
        let mut host = host_with(test_registry(), vec![]);
        let (result, _) = host.call("a.ember", "relay", "[]");
        assert_eq!(result.unwrap(), vec![Value::Bool(true)]);

        // Without delegation the contract's authority is not held.
        let (result, _) = host.call("b.ember", "check", "[]");
        assert_eq!(result.unwrap(), vec![Value::Bool(false)]);
    }

    #[test]
    fn test_reentrant_call_rejected() {
        let mut host = host_with(test_registry(), vec![]);
        let (result, _) = host.call("a.ember", "loop", "[]");
        assert!(matches!(result, Err(VmError::ReentrancyDetected { .. })));
        assert_eq!(host.call_depth(), 0);
    }
}
