/*
 * Responsibility
 * - Public interface of the middlewares
 * - firebase_auth: bearer token → Firebase verification → AuthCtx
 * - http: request id / trace / limits for the demo server
 */
pub mod firebase_auth;
pub mod http;
