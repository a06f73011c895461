//! Account storage module
//!
//! This module provides the `AccountStore`, which holds every account of a run
//! in a height-balanced (AVL) binary search tree keyed by account id.
//!
//! The AccountStore is responsible for:
//! - Pre-allocating storage for a declared maximum number of accounts
//! - Inserting accounts, rejecting duplicate ids
//! - O(log n) lookup of a stable account handle by id
//! - Reporting balances in the order accounts were first added
//!
//! # Layout
//!
//! Nodes live in an arena (`Vec<Node>`) reserved up front to the declared
//! capacity and linked by index. Rotations only rewrite links, so a node never
//! moves once written, and the arena order is the insertion order used by
//! [`AccountStore::snapshot`].
//!
//! # Sharing
//!
//! Accounts are added through `&mut self` during the load phase. Once the store
//! is wrapped in an `Arc` and handed to workers its structure is read-only;
//! only balances change, each behind its own account lock.

use crate::types::{Account, AccountId, Balance, EftError};
use std::cmp::Ordering;
use tracing::debug;

/// A tree node: the account plus its AVL links
#[derive(Debug)]
struct Node {
    account: Account,
    height: i32,
    left: Option<usize>,
    right: Option<usize>,
}

/// Balanced, pre-allocated store of all accounts in a run
#[derive(Debug, Default)]
pub struct AccountStore {
    /// Arena of tree nodes, in insertion order
    nodes: Vec<Node>,

    /// Index of the root node
    root: Option<usize>,

    /// Declared capacity; `None` until `init` succeeds
    capacity: Option<usize>,
}

impl AccountStore {
    /// Create an uninitialised store
    ///
    /// [`AccountStore::init`] must be called before accounts can be added.
    pub fn new() -> Self {
        AccountStore {
            nodes: Vec::new(),
            root: None,
            capacity: None,
        }
    }

    /// Create a store and initialise it for `capacity` accounts
    pub fn with_capacity(capacity: i64) -> Result<Self, EftError> {
        let mut store = AccountStore::new();
        store.init(capacity)?;
        Ok(store)
    }

    /// Pre-allocate storage for up to `capacity` accounts
    ///
    /// # Errors
    ///
    /// - `StoreAlreadyInitialized` if called twice
    /// - `InvalidCapacity` if `capacity < 1`
    /// - `FatalInit` if the storage cannot be allocated
    pub fn init(&mut self, capacity: i64) -> Result<(), EftError> {
        if self.capacity.is_some() {
            return Err(EftError::StoreAlreadyInitialized);
        }
        if capacity < 1 {
            return Err(EftError::InvalidCapacity { capacity });
        }

        let slots = usize::try_from(capacity)
            .map_err(|e| EftError::fatal_init("account store", &e.to_string()))?;
        self.nodes
            .try_reserve_exact(slots)
            .map_err(|e| EftError::fatal_init("account store", &e.to_string()))?;
        self.capacity = Some(slots);

        debug!(capacity = slots, "account store initialised");
        Ok(())
    }

    /// Insert a new account
    ///
    /// Returns `Ok(true)` if the account was inserted and `Ok(false)` if an
    /// account with the same id already exists (the new one is ignored, the
    /// existing balance is untouched).
    ///
    /// # Errors
    ///
    /// - `StoreNotInitialized` if `init` was never called
    /// - `StoreFull` if every pre-allocated slot is in use
    pub fn add(&mut self, id: AccountId, balance: Balance) -> Result<bool, EftError> {
        if self.capacity.is_none() {
            return Err(EftError::StoreNotInitialized);
        }

        let mut inserted = false;
        let root = self.insert_at(self.root, id, balance, &mut inserted)?;
        self.root = Some(root);

        if !inserted {
            debug!(account = id, "duplicate account id ignored");
        }
        Ok(inserted)
    }

    /// Look up an account by id
    pub fn get(&self, id: AccountId) -> Option<&Account> {
        let mut cursor = self.root;
        while let Some(index) = cursor {
            let node = &self.nodes[index];
            cursor = match id.cmp(&node.account.id()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(&node.account),
            };
        }
        None
    }

    /// Returns true if an account with `id` has been added
    pub fn contains(&self, id: AccountId) -> bool {
        self.get(id).is_some()
    }

    /// Number of accounts stored
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no account has been added
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Declared capacity, or `None` before `init`
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Height of the tree (0 when empty)
    pub fn height(&self) -> usize {
        // Heights are always >= 0
        self.height_of(self.root) as usize
    }

    /// Current balances in the order accounts were first added
    ///
    /// Each balance is read under its account lock. Call this only after all
    /// workers have joined to get final balances.
    pub fn snapshot(&self) -> Vec<(AccountId, Balance)> {
        self.nodes
            .iter()
            .map(|node| (node.account.id(), node.account.balance()))
            .collect()
    }

    /// Accounts in ascending id order
    pub fn in_order(&self) -> Vec<&Account> {
        let mut ordered = Vec::with_capacity(self.nodes.len());
        let mut stack = Vec::new();
        let mut cursor = self.root;

        while cursor.is_some() || !stack.is_empty() {
            while let Some(index) = cursor {
                stack.push(index);
                cursor = self.nodes[index].left;
            }
            if let Some(index) = stack.pop() {
                ordered.push(&self.nodes[index].account);
                cursor = self.nodes[index].right;
            }
        }

        ordered
    }

    /// Sum of all balances
    ///
    /// Widened to `i128` so that the sum itself cannot overflow.
    pub fn total_balance(&self) -> i128 {
        self.nodes
            .iter()
            .map(|node| i128::from(node.account.balance()))
            .sum()
    }

    /// Release all accounts and return to the uninitialised state
    ///
    /// Requires exclusive access, so no worker can still hold an account.
    pub fn destroy(&mut self) {
        self.nodes = Vec::new();
        self.root = None;
        self.capacity = None;
    }

    fn allocate(&mut self, id: AccountId, balance: Balance) -> Result<usize, EftError> {
        let capacity = self.capacity.ok_or(EftError::StoreNotInitialized)?;
        if self.nodes.len() >= capacity {
            return Err(EftError::StoreFull { capacity });
        }

        self.nodes.push(Node {
            account: Account::new(id, balance),
            height: 1,
            left: None,
            right: None,
        });
        Ok(self.nodes.len() - 1)
    }

    /// Insert into the subtree rooted at `node`, returning the new subtree root
    fn insert_at(
        &mut self,
        node: Option<usize>,
        id: AccountId,
        balance: Balance,
        inserted: &mut bool,
    ) -> Result<usize, EftError> {
        let Some(index) = node else {
            let fresh = self.allocate(id, balance)?;
            *inserted = true;
            return Ok(fresh);
        };

        match id.cmp(&self.key(index)) {
            Ordering::Less => {
                let left = self.nodes[index].left;
                let child = self.insert_at(left, id, balance, inserted)?;
                self.nodes[index].left = Some(child);
            }
            Ordering::Greater => {
                let right = self.nodes[index].right;
                let child = self.insert_at(right, id, balance, inserted)?;
                self.nodes[index].right = Some(child);
            }
            Ordering::Equal => return Ok(index),
        }

        self.update_height(index);
        Ok(self.rebalance(index, id))
    }

    fn rebalance(&mut self, index: usize, id: AccountId) -> usize {
        let balance = self.balance_factor(index);
        let left = self.nodes[index].left;
        let right = self.nodes[index].right;

        if balance > 1 {
            if let Some(left) = left {
                if id < self.key(left) {
                    // Left Left
                    return self.rotate_right(index);
                }
                if id > self.key(left) {
                    // Left Right
                    let pivot = self.rotate_left(left);
                    self.nodes[index].left = Some(pivot);
                    return self.rotate_right(index);
                }
            }
        }

        if balance < -1 {
            if let Some(right) = right {
                if id > self.key(right) {
                    // Right Right
                    return self.rotate_left(index);
                }
                if id < self.key(right) {
                    // Right Left
                    let pivot = self.rotate_right(right);
                    self.nodes[index].right = Some(pivot);
                    return self.rotate_left(index);
                }
            }
        }

        index
    }

    fn rotate_right(&mut self, y: usize) -> usize {
        let Some(x) = self.nodes[y].left else {
            return y;
        };
        let t2 = self.nodes[x].right;

        self.nodes[x].right = Some(y);
        self.nodes[y].left = t2;

        self.update_height(y);
        self.update_height(x);
        x
    }

    fn rotate_left(&mut self, x: usize) -> usize {
        let Some(y) = self.nodes[x].right else {
            return x;
        };
        let t2 = self.nodes[y].left;

        self.nodes[y].left = Some(x);
        self.nodes[x].right = t2;

        self.update_height(x);
        self.update_height(y);
        y
    }

    fn key(&self, index: usize) -> AccountId {
        self.nodes[index].account.id()
    }

    fn height_of(&self, node: Option<usize>) -> i32 {
        node.map_or(0, |index| self.nodes[index].height)
    }

    fn update_height(&mut self, index: usize) {
        let left = self.height_of(self.nodes[index].left);
        let right = self.height_of(self.nodes[index].right);
        self.nodes[index].height = 1 + left.max(right);
    }

    fn balance_factor(&self, index: usize) -> i32 {
        self.height_of(self.nodes[index].left) - self.height_of(self.nodes[index].right)
    }
}
