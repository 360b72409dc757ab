// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — raster decode and JPEG/PNG re-encoding.

pub mod codec;

pub use codec::ImageCodec;
