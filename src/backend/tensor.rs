//! Tensor upload of host operands for Burn device kernels.
//!
//! Device kernels take every operand as a rank-3 tensor `[1, npts, width]`.
//! [`BurnOperands`] reads the host backend's gathered views, constant
//! arrays and exchange buffers and uploads them in exactly that layout, so
//! row `i` of every uploaded tensor is still interface point `i`.
//!
//! Burn supports multiple backends:
//! - **NdArray**: CPU reference (`burn-ndarray` feature)
//! - **WGPU**: cross-platform GPU (`burn-wgpu` feature)
//! - **CUDA**: NVIDIA GPUs (`burn-cuda` feature)

use burn::prelude::*;
use faer::Mat;

use super::{BackendError, ConstId, HostBackend, MpiMatrixId, ViewId};

/// Burn backends usable for interface kernels.
pub trait TensorBackend: Backend {
    /// Default device for this backend.
    fn default_device() -> Self::Device;
}

#[cfg(feature = "burn-ndarray")]
impl TensorBackend for burn_ndarray::NdArray {
    fn default_device() -> Self::Device {
        burn_ndarray::NdArrayDevice::Cpu
    }
}

#[cfg(feature = "burn-wgpu")]
impl TensorBackend for burn_wgpu::Wgpu {
    fn default_device() -> Self::Device {
        burn_wgpu::WgpuDevice::default()
    }
}

#[cfg(feature = "burn-cuda")]
impl TensorBackend for burn_cuda::Cuda {
    fn default_device() -> Self::Device {
        burn_cuda::CudaDevice::default()
    }
}

/// Uploads host operands to one Burn device.
#[derive(Clone, Debug)]
pub struct BurnOperands<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> BurnOperands<B>
where
    B::FloatElem: From<f64>,
{
    /// Uploader for `device`.
    pub fn new(device: &B::Device) -> Self {
        Self {
            device: device.clone(),
        }
    }

    /// Upload a constant array.
    pub fn const_tensor(&self, host: &HostBackend, id: ConstId) -> Result<Tensor<B, 3>, BackendError> {
        Ok(self.tensor_from_mat(host.const_data(id)?))
    }

    /// Gather a view on the host and upload the result.
    pub fn view_tensor(&self, host: &HostBackend, id: ViewId) -> Result<Tensor<B, 3>, BackendError> {
        Ok(self.tensor_from_mat(&host.gather_view(id)?))
    }

    /// Upload a received exchange buffer.
    pub fn recv_tensor(
        &self,
        host: &HostBackend,
        id: MpiMatrixId,
    ) -> Result<Tensor<B, 3>, BackendError> {
        Ok(self.tensor_from_mat(host.recv_buffer(id)?))
    }

    fn tensor_from_mat(&self, mat: &Mat<f64>) -> Tensor<B, 3> {
        let (npts, width) = (mat.nrows(), mat.ncols());
        let mut data: Vec<B::FloatElem> = Vec::with_capacity(npts * width);
        for i in 0..npts {
            for j in 0..width {
                data.push(B::FloatElem::from(mat[(i, j)]));
            }
        }
        Tensor::from_data(
            burn::tensor::TensorData::new(data, vec![1, npts, width]),
            &self.device,
        )
    }
}

/// Download a `[1, npts, width]` tensor to row-major values.
pub fn tensor_to_vec<B: Backend>(tensor: &Tensor<B, 3>) -> Result<Vec<f64>, BackendError>
where
    f64: From<B::FloatElem>,
{
    tensor
        .to_data()
        .to_vec::<B::FloatElem>()
        .map_err(|err| BackendError::DataTransfer(format!("{err:?}")))
        .map(|values| values.into_iter().map(f64::from).collect())
}
