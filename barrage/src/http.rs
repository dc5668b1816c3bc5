use crate::iteration::Response;

impl Response {
    /// Read a `reqwest` response, including its full body.
    pub async fn from_reqwest(res: reqwest::Response) -> Result<Self, reqwest::Error> {
        let status = res.status().as_u16();
        let body = res.bytes().await?;
        Ok(Response::new(status, body.to_vec()))
    }
}
