mod diagram;
