pub mod failure_ledger;
