use ember_types::primitives::ContractId;

use crate::error::VmError;

/// Maximum nesting of contract calls within one transaction.
pub const MAX_CALL_DEPTH: usize = 8;

/// A single frame on the contract call stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    /// Contract executing in this frame.
    pub contract: ContractId,
    /// Operation being executed.
    pub function: String,
    /// Contract whose own authority was delegated to this frame through
    /// `call_with_auth`, if any.
    pub auth_from: Option<ContractId>,
}

impl CallFrame {
    pub fn new(contract: impl Into<ContractId>, function: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            function: function.into(),
            auth_from: None,
        }
    }

    pub fn with_auth_from(mut self, granter: Option<ContractId>) -> Self {
        self.auth_from = granter;
        self
    }
}

/// Tracks the nested call chain of one transaction.
///
/// Enforces [`MAX_CALL_DEPTH`] and rejects re-entrancy: a contract cannot be
/// entered while it is already on the stack.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: Vec<CallFrame>,
}

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: CallFrame) -> Result<(), VmError> {
        let depth = self.frames.len() + 1;
        if depth > MAX_CALL_DEPTH {
            return Err(VmError::CallDepthExceeded {
                depth,
                max: MAX_CALL_DEPTH,
            });
        }
        if self.contains(&frame.contract) {
            return Err(VmError::ReentrancyDetected {
                contract: frame.contract,
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<CallFrame> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn contains(&self, contract: &str) -> bool {
        self.frames.iter().any(|f| f.contract == contract)
    }

    pub fn current(&self) -> Option<&CallFrame> {
        self.frames.last()
    }

    /// Contract executing in the top frame.
    pub fn current_contract(&self) -> Option<&str> {
        self.current().map(|f| f.contract.as_str())
    }

    /// Contract authority delegated to the top frame.
    pub fn delegated_authority(&self) -> Option<&str> {
        self.current().and_then(|f| f.auth_from.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_pop() {
        let mut stack = CallStack::new();
        assert!(stack.is_empty());
        assert!(stack.current_contract().is_none());

        stack.push(CallFrame::new("gas.ember", "PledgeGas")).unwrap();
        stack.push(CallFrame::new("token.ember", "transfer")).unwrap();
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.current_contract(), Some("token.ember"));

        let frame = stack.pop().unwrap();
        assert_eq!(frame.function, "transfer");
        assert_eq!(stack.current_contract(), Some("gas.ember"));
        stack.pop();
        assert!(stack.pop().is_none());
    }

    #[test]
    fn test_depth_limit() {
        let mut stack = CallStack::new();
        for i in 0..MAX_CALL_DEPTH {
            stack.push(CallFrame::new(format!("c{i}.ember"), "f")).unwrap();
        }
        match stack.push(CallFrame::new("last.ember", "f")) {
            Err(VmError::CallDepthExceeded { depth, max }) => {
                assert_eq!(depth, MAX_CALL_DEPTH + 1);
                assert_eq!(max, MAX_CALL_DEPTH);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_reentrancy_detection() {
        let mut stack = CallStack::new();
        stack.push(CallFrame::new("gas.ember", "UnpledgeGas")).unwrap();
        stack.push(CallFrame::new("token.ember", "transferFreeze")).unwrap();
        assert!(matches!(
            stack.push(CallFrame::new("gas.ember", "PledgeGas")),
            Err(VmError::ReentrancyDetected { contract }) if contract == "gas.ember"
        ));
    }

    #[test]
    fn test_delegated_authority_is_per_frame() {
        let mut stack = CallStack::new();
        stack.push(CallFrame::new("gas.ember", "UnpledgeGas")).unwrap();
        assert!(stack.delegated_authority().is_none());

        stack
            .push(
                CallFrame::new("token.ember", "transferFreeze")
                    .with_auth_from(Some("gas.ember".into())),
            )
            .unwrap();
        assert_eq!(stack.delegated_authority(), Some("gas.ember"));

        stack.pop();
        assert!(stack.delegated_authority().is_none());
    }
}
