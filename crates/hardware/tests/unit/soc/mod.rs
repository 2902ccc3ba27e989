/// CSR register semantics.
pub mod csr;

/// Burst routing, completion timing and the core port.
pub mod interconnect;
