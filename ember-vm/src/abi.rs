use std::collections::{BTreeMap, HashMap};
use std::fmt;

use ember_types::primitives::ContractId;

use crate::cost::Cost;
use crate::error::VmError;
use crate::host::Host;

// ─── Argument Values ────────────────────────────────────────────────────────

/// Type tag of a positional operation argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    String,
    Number,
    Bool,
    Json,
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgType::String => "string",
            ArgType::Number => "number",
            ArgType::Bool => "bool",
            ArgType::Json => "json",
        };
        f.write_str(name)
    }
}

/// A decoded argument or return value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(i64),
    Bool(bool),
    Json(serde_json::Value),
}

impl Value {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Number(n) => serde_json::Value::from(*n),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Json(v) => v.clone(),
        }
    }

    fn decode(ty: ArgType, raw: serde_json::Value, position: usize) -> Result<Value, VmError> {
        let mismatch = |raw: &serde_json::Value| VmError::InvalidArgumentEncoding {
            position,
            reason: format!("expected {ty}, got {raw}"),
        };
        match (ty, raw) {
            (ArgType::String, serde_json::Value::String(s)) => Ok(Value::String(s)),
            (ArgType::Number, serde_json::Value::Number(n)) => {
                n.as_i64().map(Value::Number).ok_or_else(|| VmError::InvalidArgumentEncoding {
                    position,
                    reason: format!("{n} is not a 64-bit integer"),
                })
            }
            (ArgType::Bool, serde_json::Value::Bool(b)) => Ok(Value::Bool(b)),
            (ArgType::Json, v) => Ok(Value::Json(v)),
            (_, other) => Err(mismatch(&other)),
        }
    }
}

/// Decode a JSON array of positional arguments against `types`.
pub fn decode_args(types: &[ArgType], json: &str) -> Result<Vec<Value>, VmError> {
    let raw: Vec<serde_json::Value> =
        serde_json::from_str(json).map_err(|e| VmError::InvalidArgumentEncoding {
            position: 0,
            reason: format!("arguments must be a JSON array: {e}"),
        })?;
    if raw.len() != types.len() {
        return Err(VmError::InvalidArgumentEncoding {
            position: raw.len().min(types.len()),
            reason: format!("expected {} arguments, got {}", types.len(), raw.len()),
        });
    }
    types
        .iter()
        .zip(raw)
        .enumerate()
        .map(|(position, (ty, value))| Value::decode(*ty, value, position))
        .collect()
}

/// Encode values as a JSON array string.
pub fn encode_values(values: &[Value]) -> String {
    serde_json::Value::Array(values.iter().map(Value::to_json).collect()).to_string()
}

/// Positional reader over decoded values.
pub struct Args {
    values: std::vec::IntoIter<Value>,
    position: usize,
}

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values: values.into_iter(),
            position: 0,
        }
    }

    fn next(&mut self, expected: ArgType) -> Result<Value, VmError> {
        let position = self.position;
        self.position += 1;
        self.values
            .next()
            .ok_or_else(|| VmError::InvalidArgumentEncoding {
                position,
                reason: format!("missing {expected} argument"),
            })
    }

    pub fn string(&mut self) -> Result<String, VmError> {
        let position = self.position;
        match self.next(ArgType::String)? {
            Value::String(s) => Ok(s),
            other => Err(VmError::InvalidArgumentEncoding {
                position,
                reason: format!("expected string, got {other:?}"),
            }),
        }
    }

    pub fn number(&mut self) -> Result<i64, VmError> {
        let position = self.position;
        match self.next(ArgType::Number)? {
            Value::Number(n) => Ok(n),
            other => Err(VmError::InvalidArgumentEncoding {
                position,
                reason: format!("expected number, got {other:?}"),
            }),
        }
    }
}

/// Strongly typed argument list of one operation.
pub trait AbiArgs: Sized {
    /// Declared positional types, checked before the handler runs.
    const TYPES: &'static [ArgType];

    fn from_args(args: &mut Args) -> Result<Self, VmError>;
}

impl AbiArgs for () {
    const TYPES: &'static [ArgType] = &[];

    fn from_args(_: &mut Args) -> Result<Self, VmError> {
        Ok(())
    }
}

// ─── Registry ───────────────────────────────────────────────────────────────

/// Operation handler: runs against the host, adds what it consumed to `cost`
/// (also on failure), and returns its results.
pub type HandlerFn<A> = fn(&mut Host, &mut Cost, A) -> Result<Vec<Value>, VmError>;

type BoxedHandler =
    Box<dyn Fn(&mut Host, &mut Cost, Vec<Value>) -> Result<Vec<Value>, VmError> + Send + Sync>;

/// One exposed operation: name, argument types, and handler.
pub struct Abi {
    name: &'static str,
    arg_types: &'static [ArgType],
    handler: BoxedHandler,
}

impl Abi {
    pub fn new<A: AbiArgs + 'static>(name: &'static str, handler: HandlerFn<A>) -> Self {
        Self {
            name,
            arg_types: A::TYPES,
            handler: Box::new(move |host, cost, values| {
                let args = A::from_args(&mut Args::new(values))?;
                handler(host, cost, args)
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arg_types(&self) -> &'static [ArgType] {
        self.arg_types
    }

    /// Decode `json_args` and run the handler. Decoding failures return
    /// before the handler sees anything.
    pub fn invoke(
        &self,
        host: &mut Host,
        cost: &mut Cost,
        json_args: &str,
    ) -> Result<Vec<Value>, VmError> {
        let values = decode_args(self.arg_types, json_args)?;
        (self.handler)(host, cost, values)
    }
}

impl fmt::Debug for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Abi")
            .field("name", &self.name)
            .field("arg_types", &self.arg_types)
            .finish_non_exhaustive()
    }
}

/// The operations of one contract.
#[derive(Debug, Default)]
pub struct AbiSet {
    abis: BTreeMap<&'static str, Abi>,
}

impl AbiSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, abi: Abi) -> Self {
        self.abis.insert(abi.name, abi);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Abi> {
        self.abis.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.abis.keys().copied()
    }
}

/// Contracts known to the host, built once and shared by reference.
#[derive(Debug, Default)]
pub struct ContractRegistry {
    contracts: HashMap<ContractId, AbiSet>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the native gas and token contracts.
    pub fn with_natives() -> Self {
        let mut registry = Self::new();
        registry.register(crate::gas::contract::CONTRACT_ID, crate::gas::contract::abis());
        registry.register(crate::token::CONTRACT_ID, crate::token::abis());
        registry
    }

    /// Register (or replace) a contract's operations.
    pub fn register(&mut self, contract: impl Into<ContractId>, abis: AbiSet) {
        self.contracts.insert(contract.into(), abis);
    }

    pub fn contains(&self, contract: &str) -> bool {
        self.contracts.contains_key(contract)
    }

    pub fn abi(&self, contract: &str, name: &str) -> Result<&Abi, VmError> {
        let set = self
            .contracts
            .get(contract)
            .ok_or_else(|| VmError::ContractNotFound {
                contract: contract.to_string(),
            })?;
        set.get(name).ok_or_else(|| VmError::AbiNotFound {
            contract: contract.to_string(),
            name: name.to_string(),
        })
    }
}
